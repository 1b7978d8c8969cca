//! Sequencer thread that drives the engine tick loop.

use crate::engine::TransportEngine;
use crate::{Error, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerCommand {
    /// Run the next tick now instead of waiting out the interval.
    Wake,
    Shutdown,
}

/// Calls [`TransportEngine::tick`] every `tick_interval` until the engine
/// quits or the thread is stopped.
pub struct SequencerThread {
    engine: Arc<TransportEngine>,
    command_tx: Sender<SequencerCommand>,
    command_rx: Option<Receiver<SequencerCommand>>,
    thread_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
}

impl SequencerThread {
    pub fn new(engine: Arc<TransportEngine>) -> Self {
        let tick_interval = engine.config().tick_interval;
        let (tx, rx) = bounded(16);
        Self {
            engine,
            command_tx: tx,
            command_rx: Some(rx),
            thread_handle: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            tick_interval,
        }
    }

    pub fn command_sender(&self) -> Sender<SequencerCommand> {
        self.command_tx.clone()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.thread_handle.is_some() {
            return Ok(());
        }

        let rx = self
            .command_rx
            .take()
            .ok_or_else(|| Error::Thread("sequencer thread cannot be restarted".to_string()))?;
        let engine = Arc::clone(&self.engine);
        let shutdown = Arc::clone(&self.shutdown);
        let running = Arc::clone(&self.running);
        let tick_interval = self.tick_interval;

        running.store(true, Ordering::SeqCst);
        let handle = thread::Builder::new()
            .name("rondo-sequencer".into())
            .spawn(move || {
                if let Err(e) = thread_priority::set_current_thread_priority(ThreadPriority::Max) {
                    debug!(error = ?e, "could not raise sequencer thread priority");
                }
                sequencer_loop(&engine, &rx, &shutdown, tick_interval);
                running.store(false, Ordering::SeqCst);
            });

        match handle {
            Ok(handle) => {
                self.thread_handle = Some(handle);
                info!(?tick_interval, "sequencer thread started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Tick as soon as possible, e.g. right after queueing a transport request.
    pub fn wake(&self) {
        let _ = self.command_tx.try_send(SequencerCommand::Wake);
    }

    /// True until the loop exits, either stopped here or because the engine quit.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.command_tx.try_send(SequencerCommand::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            debug!("sequencer thread joined");
        }
    }
}

impl Drop for SequencerThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sequencer_loop(
    engine: &TransportEngine,
    rx: &Receiver<SequencerCommand>,
    shutdown: &AtomicBool,
    tick_interval: Duration,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        if !engine.tick() {
            info!("engine quit, sequencer thread exiting");
            break;
        }

        match rx.recv_timeout(tick_interval) {
            Ok(SequencerCommand::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Ok(SequencerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
