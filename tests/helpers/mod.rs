//! Test helpers and fixtures for rondo integration tests
//!
//! Every fixture runs the engine against `MockDriver`, so tests drive ticks
//! by hand, move the clock explicitly, and assert on the exact driver calls.

#![allow(dead_code)]

use rondo::driver::{DriverCall, MockDriver, MockHandle};
use rondo::prelude::*;
use rondo::RecordHost;
use std::path::PathBuf;
use std::sync::Arc;

pub fn ms(v: i64) -> RealTime {
    RealTime::from_millis(v)
}

pub fn sizes(read_ahead_ms: i64) -> BufferSizes {
    BufferSizes {
        read_ahead: ms(read_ahead_ms),
        ..BufferSizes::default()
    }
}

pub fn note(instrument: u32, at_ms: i64, dur_ms: i64, pitch: u8) -> MappedEvent {
    MappedEvent::note(instrument, pitch, 100, ms(at_ms), ms(dur_ms))
}

/// Install a fmt subscriber once so `RUST_LOG=debug` shows engine logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine on a mock driver with nothing armed. The call log starts empty.
pub fn mock_engine() -> (Arc<TransportEngine>, MockHandle) {
    mock_engine_with_host(Arc::new(rondo::NoRecordHost))
}

pub fn mock_engine_with_host(host: Arc<dyn RecordHost>) -> (Arc<TransportEngine>, MockHandle) {
    init_tracing();
    let (driver, handle) = MockDriver::new();
    let engine = TransportEngine::builder()
        .driver(driver)
        .record_host(host)
        .build()
        .expect("Failed to create test engine");
    handle.take_calls();
    (engine, handle)
}

/// Play from `start` and run the tick that starts the driver.
pub fn start_playing(engine: &TransportEngine, start: RealTime, read_ahead_ms: i64) {
    assert!(engine.play(start, sizes(read_ahead_ms)));
    assert!(engine.tick());
    assert_eq!(engine.status(), TransportStatus::Playing);
}

/// `(start, end)` of every timed batch handed to the driver.
pub fn fetch_windows(calls: &[DriverCall]) -> Vec<(RealTime, RealTime)> {
    calls
        .iter()
        .filter_map(|c| match c {
            DriverCall::ProcessEventsOut { start, end, .. } => Some((*start, *end)),
            _ => None,
        })
        .collect()
}

/// Every event handed to the driver in timed batches.
pub fn events_out(calls: &[DriverCall]) -> Vec<MappedEvent> {
    calls
        .iter()
        .filter_map(|c| match c {
            DriverCall::ProcessEventsOut { events, .. } => Some(events.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Every event emitted immediately, one entry per driver call.
pub fn events_now(calls: &[DriverCall]) -> Vec<Vec<MappedEvent>> {
    calls
        .iter()
        .filter_map(|c| match c {
            DriverCall::ProcessEventsNow(events) => Some(events.clone()),
            _ => None,
        })
        .collect()
}

/// Calls other than the per-tick housekeeping flush.
pub fn significant(calls: Vec<DriverCall>) -> Vec<DriverCall> {
    calls
        .into_iter()
        .filter(|c| *c != DriverCall::ProcessPending)
        .collect()
}

/// Record host that always hands back fewer files than requested.
pub struct ShortHost {
    pub armed: Vec<u32>,
}

impl RecordHost for ShortHost {
    fn armed_instruments(&self) -> Vec<u32> {
        self.armed.clone()
    }

    fn create_record_audio_files(&self, audio_instruments: &[u32]) -> Vec<PathBuf> {
        audio_instruments
            .iter()
            .skip(1)
            .map(|id| PathBuf::from(format!("/tmp/short-{id}.wav")))
            .collect()
    }
}
