//! Call-logging driver with a manually advanced clock.
//!
//! [`MockDriver::new`] returns the driver and a [`MockHandle`] sharing its
//! state, so a test can hand the driver to an engine and still inspect the
//! exact sequence of calls, move the clock, and inject input.

use crate::driver::{DriverStatus, ExternalTransport, MappedInstrument, SoundDriver};
use crate::error::{DriverError, Result};
use parking_lot::Mutex;
use rondo_core::{
    BufferSizes, InstrumentId, LoopRange, MappedEvent, MappedEventList, RealTime, RecordStatus,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Initialise,
    Shutdown,
    InitialisePlayback(RealTime),
    StopPlayback,
    PunchOut,
    ResetPlayback(RealTime, RealTime),
    StartClocks,
    StopClocks,
    SetBufferSizes(BufferSizes),
    SetLoop(LoopRange),
    ProcessEventsOut {
        events: Vec<MappedEvent>,
        start: RealTime,
        end: RealTime,
    },
    ProcessEventsNow(Vec<MappedEvent>),
    ProcessPending,
    InitialiseAudioQueue(Vec<MappedEvent>),
    Record {
        status: RecordStatus,
        armed: Vec<InstrumentId>,
        files: Vec<PathBuf>,
    },
    AddAudioFile(u32),
    RemoveAudioFile(u32),
    ClearAudioFiles,
    SetMidiClockInterval(RealTime),
    SetLowLatencyMode(bool),
    SetMappedInstrument(MappedInstrument),
    CheckForNewClients,
}

struct MockState {
    calls: Vec<DriverCall>,
    run_tasks: u64,
    initialise_fails: bool,
    record_fails: bool,
    playing: bool,
    time: RealTime,
    start_position: RealTime,
    latencies: BTreeMap<InstrumentId, RealTime>,
    incoming: MappedEventList,
    new_clients: bool,
    external: Option<Arc<dyn ExternalTransport>>,
}

/// Test-side view of a [`MockDriver`].
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            calls: Vec::new(),
            run_tasks: 0,
            initialise_fails: false,
            record_fails: false,
            playing: false,
            time: RealTime::ZERO,
            start_position: RealTime::ZERO,
            latencies: BTreeMap::new(),
            incoming: MappedEventList::new(),
            new_clients: false,
            external: None,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockHandle { state },
        )
    }

    fn log(&self, call: DriverCall) {
        self.state.lock().calls.push(call);
    }
}

impl MockHandle {
    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().calls.clone()
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn take_calls(&self) -> Vec<DriverCall> {
        std::mem::take(&mut self.state.lock().calls)
    }

    pub fn run_tasks_count(&self) -> u64 {
        self.state.lock().run_tasks
    }

    pub fn set_time(&self, time: RealTime) {
        self.state.lock().time = time;
    }

    pub fn set_start_position(&self, position: RealTime) {
        self.state.lock().start_position = position;
    }

    pub fn set_instrument_latency(&self, instrument: InstrumentId, latency: RealTime) {
        self.state.lock().latencies.insert(instrument, latency);
    }

    pub fn fail_initialise(&self, fail: bool) {
        self.state.lock().initialise_fails = fail;
    }

    pub fn fail_record(&self, fail: bool) {
        self.state.lock().record_fails = fail;
    }

    pub fn push_incoming(&self, event: MappedEvent) {
        self.state.lock().incoming.insert(event);
    }

    pub fn set_new_clients(&self, changed: bool) {
        self.state.lock().new_clients = changed;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// The transport the engine registered, if any.
    pub fn external_transport(&self) -> Option<Arc<dyn ExternalTransport>> {
        self.state.lock().external.clone()
    }
}

impl SoundDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn initialise(&mut self) -> Result<()> {
        self.log(DriverCall::Initialise);
        if self.state.lock().initialise_fails {
            return Err(DriverError::Unavailable("mock configured to fail".to_string()));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log(DriverCall::Shutdown);
    }

    fn status(&self) -> DriverStatus {
        if self.state.lock().initialise_fails {
            DriverStatus::NO_DRIVER
        } else {
            DriverStatus::AUDIO_OK | DriverStatus::MIDI_OK
        }
    }

    fn status_log(&self) -> String {
        format!("mock: {} calls", self.state.lock().calls.len())
    }

    fn initialise_playback(&mut self, position: RealTime) {
        let mut s = self.state.lock();
        s.playing = true;
        s.start_position = position;
        s.time = position;
        s.calls.push(DriverCall::InitialisePlayback(position));
    }

    fn stop_playback(&mut self) {
        let mut s = self.state.lock();
        s.playing = false;
        s.calls.push(DriverCall::StopPlayback);
    }

    fn punch_out(&mut self) {
        self.log(DriverCall::PunchOut);
    }

    fn reset_playback(&mut self, old_position: RealTime, new_position: RealTime) {
        let mut s = self.state.lock();
        s.time = new_position;
        s.start_position = new_position;
        s.calls
            .push(DriverCall::ResetPlayback(old_position, new_position));
    }

    fn start_clocks(&mut self) {
        self.log(DriverCall::StartClocks);
    }

    fn stop_clocks(&mut self) {
        self.log(DriverCall::StopClocks);
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn set_audio_buffer_sizes(&mut self, sizes: &BufferSizes) {
        self.log(DriverCall::SetBufferSizes(*sizes));
    }

    fn set_loop(&mut self, range: LoopRange) {
        self.log(DriverCall::SetLoop(range));
    }

    fn sequencer_time(&self) -> RealTime {
        self.state.lock().time
    }

    fn start_position(&self) -> RealTime {
        self.state.lock().start_position
    }

    fn process_events_out(
        &mut self,
        events: &MappedEventList,
        window_start: RealTime,
        window_end: RealTime,
    ) {
        self.log(DriverCall::ProcessEventsOut {
            events: events.as_slice().to_vec(),
            start: window_start,
            end: window_end,
        });
    }

    fn process_events_now(&mut self, events: &MappedEventList) {
        self.log(DriverCall::ProcessEventsNow(events.as_slice().to_vec()));
    }

    fn process_pending(&mut self) {
        self.log(DriverCall::ProcessPending);
    }

    fn initialise_audio_queue(&mut self, events: &[MappedEvent]) {
        self.log(DriverCall::InitialiseAudioQueue(events.to_vec()));
    }

    fn run_tasks(&mut self) {
        self.state.lock().run_tasks += 1;
    }

    fn record(
        &mut self,
        status: RecordStatus,
        armed_instruments: &[InstrumentId],
        audio_files: &[PathBuf],
    ) -> Result<()> {
        let mut s = self.state.lock();
        s.calls.push(DriverCall::Record {
            status,
            armed: armed_instruments.to_vec(),
            files: audio_files.to_vec(),
        });
        if s.record_fails && status == RecordStatus::RecordOn {
            return Err(DriverError::RecordRejected("mock configured to fail".to_string()));
        }
        Ok(())
    }

    fn drain_incoming(&mut self) -> MappedEventList {
        self.state.lock().incoming.take()
    }

    fn instrument_play_latency(&self, instrument: InstrumentId) -> RealTime {
        self.state
            .lock()
            .latencies
            .get(&instrument)
            .copied()
            .unwrap_or(RealTime::ZERO)
    }

    fn maximum_play_latency(&self) -> RealTime {
        self.state
            .lock()
            .latencies
            .values()
            .copied()
            .max()
            .unwrap_or(RealTime::ZERO)
    }

    fn sample_rate(&self) -> u32 {
        44_100
    }

    fn set_midi_clock_interval(&mut self, interval: RealTime) {
        self.log(DriverCall::SetMidiClockInterval(interval));
    }

    fn set_low_latency_mode(&mut self, enabled: bool) {
        self.log(DriverCall::SetLowLatencyMode(enabled));
    }

    fn sleep(&self, _duration: std::time::Duration) {}

    fn add_audio_file(&mut self, _path: &Path, id: u32) -> Result<()> {
        self.log(DriverCall::AddAudioFile(id));
        Ok(())
    }

    fn remove_audio_file(&mut self, id: u32) -> Result<()> {
        self.log(DriverCall::RemoveAudioFile(id));
        Ok(())
    }

    fn clear_audio_files(&mut self) {
        self.log(DriverCall::ClearAudioFiles);
    }

    fn check_for_new_clients(&mut self) -> bool {
        let mut s = self.state.lock();
        s.calls.push(DriverCall::CheckForNewClients);
        std::mem::take(&mut s.new_clients)
    }

    fn set_mapped_instrument(&mut self, instrument: MappedInstrument) {
        self.log(DriverCall::SetMappedInstrument(instrument));
    }

    fn set_external_transport(&mut self, transport: Arc<dyn ExternalTransport>) {
        self.state.lock().external = Some(transport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_sees_driver_calls() {
        let (mut driver, handle) = MockDriver::new();
        driver.initialise_playback(RealTime::new(1, 0));
        driver.start_clocks();
        driver.run_tasks();
        assert_eq!(
            handle.calls(),
            vec![
                DriverCall::InitialisePlayback(RealTime::new(1, 0)),
                DriverCall::StartClocks
            ]
        );
        assert_eq!(handle.run_tasks_count(), 1);
        assert!(handle.is_playing());
    }

    #[test]
    fn test_manual_clock() {
        let (driver, handle) = MockDriver::new();
        handle.set_time(RealTime::new(3, 0));
        assert_eq!(driver.sequencer_time(), RealTime::new(3, 0));
    }

    #[test]
    fn test_record_failure() {
        let (mut driver, handle) = MockDriver::new();
        handle.fail_record(true);
        assert!(driver.record(RecordStatus::RecordOn, &[1000], &[]).is_err());
        assert!(driver.record(RecordStatus::RecordOff, &[], &[]).is_ok());
    }
}
