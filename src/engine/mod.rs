//! The transport engine: state machine, fetch pipeline and locked API.
//!
//! ```text
//!  control thread                         sequencer thread
//!  play/record/stop/jump_to ──┐     ┌──── tick(): update_clocks, start/keep playing,
//!  mapped objects, devices    │     │             async relay, transport requests
//!                             ▼     ▼
//!                 ReentrantMutex<RefCell<EngineState>>
//!                             │
//!              ┌──────────────┼──────────────┐
//!              ▼              ▼              ▼
//!         SoundDriver    MetaIterator    song position, loop, buffers
//! ```
//!
//! Every public entry point takes the engine lock. The lock is re-entrant
//! because some entry points call others (`record` calls `play` and `stop`,
//! connecting mapped objects calls `jump_to`). A `RefCell` borrow is never held
//! across such a call or across a [`RecordHost`] callback.

mod driver_api;
mod playback;
mod studio_api;

pub use playback::compensate_latency;

use crate::config::EngineConfig;
use crate::host::RecordHost;
use crate::meta_iterator::MetaIterator;
use crate::monitor::PlaybackMonitor;
use crate::relay::AsyncRelay;
use crate::routing::RoutingTable;
use crate::transport_sync::TransportSync;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rondo_core::{
    is_audio_instrument, BufferSizes, LoopRange, MappedEvent, MappedEventList, RealTime,
    RecordStatus, TransportRequest, TransportStatus,
};
use rondo_driver::{ExternalTransport, SoundDriver};
use rondo_studio::Studio;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub(crate) struct EngineState {
    pub(crate) driver: Box<dyn SoundDriver>,
    pub(crate) status: TransportStatus,
    pub(crate) iterator: MetaIterator,
    pub(crate) song_position: RealTime,
    /// Everything before this has already been handed to the driver.
    pub(crate) last_fetch: RealTime,
    /// Start of the previous fetch window, for detecting backward jumps.
    pub(crate) last_start: RealTime,
    pub(crate) loop_range: LoopRange,
    pub(crate) buffer_sizes: BufferSizes,
    pub(crate) last_client_check: Instant,
}

/// Everything a [`TransportEngine`] is assembled from.
pub(crate) struct EngineParts {
    pub driver: Box<dyn SoundDriver>,
    pub status: TransportStatus,
    pub config: EngineConfig,
    pub studio: Arc<Studio>,
    pub sync: Arc<TransportSync>,
    pub host: Arc<dyn RecordHost>,
}

/// Real-time transport engine.
///
/// Created through [`TransportEngineBuilder`](crate::TransportEngineBuilder)
/// and shared as `Arc<TransportEngine>` between the control side and a
/// [`SequencerThread`](crate::SequencerThread).
pub struct TransportEngine {
    state: ReentrantMutex<RefCell<EngineState>>,
    config: EngineConfig,
    studio: Arc<Studio>,
    sync: Arc<TransportSync>,
    relay: AsyncRelay,
    routing: RoutingTable,
    monitor: PlaybackMonitor,
    host: Arc<dyn RecordHost>,
}

type StateGuard<'a> = ReentrantMutexGuard<'a, RefCell<EngineState>>;

impl TransportEngine {
    pub(crate) fn from_parts(parts: EngineParts) -> Self {
        let monitor = PlaybackMonitor::new();
        monitor.set_status(parts.status);
        monitor.set_driver_status(parts.driver.status());
        let buffer_sizes = parts.config.buffer_sizes().normalised();

        Self {
            state: ReentrantMutex::new(RefCell::new(EngineState {
                driver: parts.driver,
                status: parts.status,
                iterator: MetaIterator::new(),
                song_position: RealTime::ZERO,
                last_fetch: RealTime::ZERO,
                last_start: RealTime::ZERO,
                loop_range: LoopRange::default(),
                buffer_sizes,
                last_client_check: Instant::now(),
            })),
            config: parts.config,
            studio: parts.studio,
            sync: parts.sync,
            relay: AsyncRelay::new(),
            routing: RoutingTable::new(),
            monitor,
            host: parts.host,
        }
    }

    #[inline]
    fn lock(&self) -> StateGuard<'_> {
        self.state.lock()
    }

    fn set_status(&self, state: &mut EngineState, status: TransportStatus) {
        if state.status != status {
            debug!(from = ?state.status, to = ?status, "transport status");
        }
        state.status = status;
        self.monitor.set_status(status);
    }

    fn publish_position(&self, position: RealTime) {
        self.monitor.set_position(position);
    }

    // --- accessors --------------------------------------------------------

    pub fn status(&self) -> TransportStatus {
        self.lock().borrow().status
    }

    pub fn song_position(&self) -> RealTime {
        self.lock().borrow().song_position
    }

    /// End of the range already handed to the driver.
    pub fn last_fetch_position(&self) -> RealTime {
        self.lock().borrow().last_fetch
    }

    pub fn loop_range(&self) -> LoopRange {
        self.lock().borrow().loop_range
    }

    pub fn is_looping(&self) -> bool {
        self.lock().borrow().loop_range.is_active()
    }

    /// Buffer sizes from the most recent `play`/`record`, or the configured ones.
    pub fn buffer_sizes(&self) -> BufferSizes {
        self.lock().borrow().buffer_sizes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn studio(&self) -> &Arc<Studio> {
        &self.studio
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn monitor(&self) -> &PlaybackMonitor {
        &self.monitor
    }

    pub fn relay(&self) -> &AsyncRelay {
        &self.relay
    }

    pub fn transport_sync(&self) -> &Arc<TransportSync> {
        &self.sync
    }

    #[inline]
    pub fn transport_token(&self) -> u64 {
        self.sync.token()
    }

    // --- transport --------------------------------------------------------

    /// Start playback from `time`.
    ///
    /// While recording this punches out instead and keeps playing. The status
    /// becomes `Starting`; the next tick kicks off the driver. A zero read-ahead
    /// is replaced with one second.
    pub fn play(&self, time: RealTime, sizes: BufferSizes) -> bool {
        let guard = self.lock();
        let mut st = guard.borrow_mut();

        match st.status {
            TransportStatus::Playing | TransportStatus::Starting => return true,
            TransportStatus::Recording => {
                st.driver.punch_out();
                self.set_status(&mut st, TransportStatus::Playing);
                self.sync.increment_token();
                info!("punched out of recording");
                return true;
            }
            TransportStatus::Quit => return false,
            _ => {}
        }

        st.song_position = time;
        self.publish_position(time);

        if st.status != TransportStatus::StartingToRecord {
            self.set_status(&mut st, TransportStatus::Starting);
        }

        st.driver.stop_clocks();
        let sizes = sizes.normalised();
        st.buffer_sizes = sizes;
        st.driver.set_audio_buffer_sizes(&sizes);
        debug!(%time, read_ahead = %sizes.read_ahead, "play requested");
        true
    }

    /// Start recording from `time`.
    ///
    /// `mode` must be `StartingToRecord` or `Recording`; anything else returns
    /// false and changes nothing. Asking for `StartingToRecord` while already
    /// playing punches in without restarting playback. On failure to obtain
    /// one audio file per armed audio instrument, or if the driver refuses to
    /// record, the transport is stopped and false returned.
    pub fn record(&self, time: RealTime, sizes: BufferSizes, mode: TransportStatus) -> bool {
        let guard = self.lock();

        let mode = {
            let st = guard.borrow();
            if st.status == TransportStatus::Quit {
                return false;
            }
            if st.status == TransportStatus::Playing && mode == TransportStatus::StartingToRecord
            {
                TransportStatus::Recording
            } else {
                mode
            }
        };

        if !matches!(
            mode,
            TransportStatus::StartingToRecord | TransportStatus::Recording
        ) {
            warn!(?mode, "unsupported record mode");
            return false;
        }

        let armed = self.host.armed_instruments();
        let audio: Vec<_> = armed
            .iter()
            .copied()
            .filter(|id| is_audio_instrument(*id))
            .collect();
        let files = if audio.is_empty() {
            Vec::new()
        } else {
            self.host.create_record_audio_files(&audio)
        };

        if files.len() != audio.len() {
            error!(
                wanted = audio.len(),
                got = files.len(),
                "could not create a record file for every armed audio instrument"
            );
            self.stop();
            return false;
        }

        {
            let mut st = guard.borrow_mut();
            if let Err(e) = st.driver.record(RecordStatus::RecordOn, &armed, &files) {
                error!(error = %e, "driver refused to start recording");
                drop(st);
                self.stop();
                return false;
            }

            self.set_status(&mut st, mode);
            if mode == TransportStatus::Recording {
                self.sync.increment_token();
                info!(armed = armed.len(), "punched in");
                return true;
            }

            let position = st.song_position;
            st.driver.initialise_playback(position);
        }

        info!(%time, armed = armed.len(), "recording requested");
        self.play(time, sizes)
    }

    /// Stop playback or recording and rewind the bookkeeping to zero.
    ///
    /// Always bumps the transport token, even when already stopped.
    pub fn stop(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.status == TransportStatus::Quit {
            return;
        }

        self.set_status(&mut st, TransportStatus::Stopping);
        st.driver.stop_playback();

        st.song_position = RealTime::ZERO;
        st.last_fetch = RealTime::ZERO;
        self.publish_position(RealTime::ZERO);

        self.sync.increment_token();
        self.set_status(&mut st, TransportStatus::Stopped);
        debug!("stopped");
    }

    /// Stop recording and keep playing. False unless recording.
    pub fn punch_out(&self) -> bool {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.status != TransportStatus::Recording {
            return false;
        }
        st.driver.punch_out();
        self.set_status(&mut st, TransportStatus::Playing);
        self.sync.increment_token();
        info!("punched out");
        true
    }

    /// Move the playhead. Negative positions are ignored.
    ///
    /// When the driver is playing, one read-ahead window from `position` is
    /// queued before the clocks restart.
    pub fn jump_to(&self, position: RealTime) {
        if position.is_negative() {
            debug!(%position, "ignoring jump to negative position");
            return;
        }

        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.status == TransportStatus::Quit {
            return;
        }

        st.driver.stop_clocks();

        let old = st.song_position;
        st.song_position = position;
        st.last_fetch = position;
        self.publish_position(position);

        st.driver.reset_playback(old, position);

        if st.driver.is_playing() {
            let end = st.read_ahead_end(position);
            let events = st.fetch_events(position, end, true);
            st.driver.process_events_out(&events, position, end);
            st.last_fetch = end;
        }

        self.sync.increment_token();
        st.driver.start_clocks();
        debug!(from = %old, to = %position, "jumped");
    }

    /// Set the loop range. `end <= start` turns looping off.
    pub fn set_loop(&self, start: RealTime, end: RealTime) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        let range = LoopRange::new(start, end);
        st.loop_range = range;
        st.driver.set_loop(range);
        debug!(%start, %end, active = range.is_active(), "loop set");
    }

    /// Enter the terminal `Quit` state. The sequencer thread exits on its next tick.
    pub fn quit(&self) {
        let guard = self.lock();
        let mut st = guard.borrow_mut();
        if st.status == TransportStatus::Quit {
            return;
        }
        self.set_status(&mut st, TransportStatus::Quit);
        self.sync.increment_token();
        info!("transport quit");
    }

    // --- transport requests -----------------------------------------------

    /// Queue a request for the sequencer thread. Returns the token that
    /// [`is_transport_sync_complete`](Self::is_transport_sync_complete) reports
    /// complete once the request has taken effect.
    pub fn transport_change(&self, request: TransportRequest) -> u64 {
        self.sync.transport_change(request)
    }

    pub fn transport_jump(&self, request: TransportRequest, time: RealTime) -> u64 {
        self.sync.transport_jump(request, time)
    }

    pub fn is_transport_sync_complete(&self, token: u64) -> bool {
        self.sync.is_transport_sync_complete(token)
    }

    /// Oldest pending transport request.
    pub fn next_transport_request(&self) -> Option<(TransportRequest, RealTime)> {
        self.sync.next_request()
    }

    /// Carry out one transport request.
    pub fn apply_transport_request(&self, request: TransportRequest, time: RealTime) {
        let _guard = self.lock();
        debug!(?request, %time, "applying transport request");
        match request {
            TransportRequest::NoChange => {}
            TransportRequest::Stop => self.stop(),
            TransportRequest::Start => {
                let (position, sizes) = self.position_and_sizes();
                self.play(position, sizes);
            }
            TransportRequest::Record => {
                let (position, sizes) = self.position_and_sizes();
                self.record(position, sizes, TransportStatus::StartingToRecord);
            }
            TransportRequest::Jump => {
                self.jump_to(time);
                // transport_jump promised two generations
                self.sync.increment_token();
            }
            TransportRequest::StartAtTime => {
                self.jump_to(time);
                let (position, sizes) = self.position_and_sizes();
                self.play(position, sizes);
            }
            TransportRequest::StopAtTime => {
                self.stop();
                self.jump_to(time);
            }
        }
    }

    fn position_and_sizes(&self) -> (RealTime, BufferSizes) {
        let guard = self.lock();
        let st = guard.borrow();
        (st.song_position, st.buffer_sizes)
    }

    // --- async relay ------------------------------------------------------

    /// Queue an event for immediate emission on the next tick.
    pub fn process_mapped_event(&self, event: MappedEvent) {
        self.relay.queue_outbound(event);
    }

    /// Take every ad-hoc event received from the driver since the last call.
    pub fn pull_asynchronous_midi_queue(&self) -> MappedEventList {
        self.relay.pull_inbound()
    }
}

impl Drop for TransportEngine {
    fn drop(&mut self) {
        let st = self.state.get_mut().get_mut();
        st.driver.shutdown();
        debug!(driver = st.driver.name(), "driver shut down");
    }
}
