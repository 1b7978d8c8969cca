//! Hardware-free driver driven by a monotonic soft clock.

use crate::driver::{
    DeviceDirection, DeviceInfo, DeviceType, DriverStatus, MappedInstrument, SoundDriver,
};
use crate::error::{DriverError, Result};
use crate::input::{InputPort, InputProducer};
use rondo_core::{
    BufferSizes, DeviceId, InstrumentId, LoopRange, MappedEvent, MappedEventList, RealTime,
    RecordStatus,
};
use rondo_studio::Studio;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const INPUT_CAPACITY: usize = 1024;
const DEFAULT_SAMPLE_RATE: u32 = 48_000;

const MIDI_PLAY_CONNECTIONS: &[&str] = &["Soft Synth Port 1", "Soft Synth Port 2"];
const MIDI_RECORD_CONNECTIONS: &[&str] = &["Virtual Keyboard"];

/// Driver that keeps time and bookkeeping but produces no sound.
///
/// The clock is an [`Instant`] anchor: while running, song time is the
/// position at which the clock was (re)started plus the elapsed wall time.
/// Inbound events are injected through [`DummyDriver::input_producer`].
pub struct DummyDriver {
    name: String,
    available: bool,
    initialised: bool,
    playing: bool,
    recording: bool,

    clock_anchor: Option<Instant>,
    clock_origin: RealTime,
    start_position: RealTime,

    buffer_sizes: BufferSizes,
    loop_range: LoopRange,
    sample_rate: u32,
    midi_clock_interval: RealTime,
    low_latency: bool,
    instrument_latencies: BTreeMap<InstrumentId, RealTime>,

    audio_files: BTreeMap<u32, PathBuf>,
    audio_queue: Vec<MappedEvent>,
    devices: BTreeMap<DeviceId, DeviceInfo>,
    mapped_instruments: BTreeMap<InstrumentId, MappedInstrument>,
    studio: Option<Arc<Studio>>,

    input: InputPort,
    events_sent: u64,
}

impl Default for DummyDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyDriver {
    pub fn new() -> Self {
        Self {
            name: "dummy".to_string(),
            available: true,
            initialised: false,
            playing: false,
            recording: false,
            clock_anchor: None,
            clock_origin: RealTime::ZERO,
            start_position: RealTime::ZERO,
            buffer_sizes: BufferSizes::default(),
            loop_range: LoopRange::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            midi_clock_interval: RealTime::ZERO,
            low_latency: false,
            instrument_latencies: BTreeMap::new(),
            audio_files: BTreeMap::new(),
            audio_queue: Vec::new(),
            devices: BTreeMap::new(),
            mapped_instruments: BTreeMap::new(),
            studio: None,
            input: InputPort::new(INPUT_CAPACITY),
            events_sent: 0,
        }
    }

    /// A driver whose subsystem could not be opened. `initialise` fails.
    pub fn unavailable() -> Self {
        Self {
            name: "unavailable".to_string(),
            available: false,
            ..Self::new()
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Give `instrument` a fixed output latency.
    pub fn with_instrument_latency(mut self, instrument: InstrumentId, latency: RealTime) -> Self {
        self.instrument_latencies.insert(instrument, latency);
        self
    }

    /// Producer for injecting inbound events. Only the first call returns `Some`.
    pub fn input_producer(&mut self) -> Option<InputProducer> {
        self.input.take_producer()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn events_sent(&self) -> u64 {
        self.events_sent
    }

    pub fn buffer_sizes(&self) -> &BufferSizes {
        &self.buffer_sizes
    }

    pub fn loop_range(&self) -> LoopRange {
        self.loop_range
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.values()
    }

    fn candidates(device_type: DeviceType, direction: DeviceDirection) -> &'static [&'static str] {
        match (device_type, direction) {
            (DeviceType::Midi, DeviceDirection::Play) => MIDI_PLAY_CONNECTIONS,
            (DeviceType::Midi, DeviceDirection::Record) => MIDI_RECORD_CONNECTIONS,
            _ => &[],
        }
    }
}

impl SoundDriver for DummyDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialise(&mut self) -> Result<()> {
        if !self.available {
            return Err(DriverError::Unavailable(
                "no audio or MIDI subsystem".to_string(),
            ));
        }
        self.initialised = true;
        tracing::info!(sample_rate = self.sample_rate, "dummy driver initialised");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop_playback();
        self.initialised = false;
        tracing::debug!("dummy driver shut down");
    }

    fn status(&self) -> DriverStatus {
        if self.available && self.initialised {
            DriverStatus::AUDIO_OK | DriverStatus::MIDI_OK
        } else {
            DriverStatus::NO_DRIVER
        }
    }

    fn status_log(&self) -> String {
        let studio_objects = self.studio.as_ref().map_or(0, |s| s.len());
        format!(
            "{}: initialised={} playing={} recording={} audio_files={} devices={} studio_objects={} events_sent={}",
            self.name,
            self.initialised,
            self.playing,
            self.recording,
            self.audio_files.len(),
            self.devices.len(),
            studio_objects,
            self.events_sent,
        )
    }

    fn initialise_playback(&mut self, position: RealTime) {
        self.playing = true;
        self.clock_anchor = None;
        self.clock_origin = position;
        self.start_position = position;
    }

    fn stop_playback(&mut self) {
        self.playing = false;
        self.recording = false;
        self.clock_anchor = None;
        self.audio_queue.clear();
    }

    fn punch_out(&mut self) {
        self.recording = false;
    }

    fn reset_playback(&mut self, old_position: RealTime, new_position: RealTime) {
        tracing::trace!(%old_position, %new_position, "reset playback");
        self.clock_origin = new_position;
        self.start_position = new_position;
        if self.clock_anchor.is_some() {
            self.clock_anchor = Some(Instant::now());
        }
    }

    fn start_clocks(&mut self) {
        if self.clock_anchor.is_none() {
            self.clock_anchor = Some(Instant::now());
        }
    }

    fn stop_clocks(&mut self) {
        self.clock_origin = self.sequencer_time();
        self.clock_anchor = None;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_audio_buffer_sizes(&mut self, sizes: &BufferSizes) {
        self.buffer_sizes = *sizes;
    }

    fn set_loop(&mut self, range: LoopRange) {
        self.loop_range = range;
    }

    fn sequencer_time(&self) -> RealTime {
        match self.clock_anchor {
            Some(anchor) => self.clock_origin + RealTime::from_duration(anchor.elapsed()),
            None => self.clock_origin,
        }
    }

    fn start_position(&self) -> RealTime {
        self.start_position
    }

    fn process_events_out(
        &mut self,
        events: &MappedEventList,
        _window_start: RealTime,
        _window_end: RealTime,
    ) {
        self.events_sent += events.len() as u64;
        self.audio_queue
            .extend(events.iter().filter(|e| e.is_audio()).copied());
    }

    fn process_events_now(&mut self, events: &MappedEventList) {
        self.events_sent += events.len() as u64;
    }

    fn process_pending(&mut self) {
        let now = self.sequencer_time();
        self.audio_queue.retain(|e| e.end_time() > now);
    }

    fn initialise_audio_queue(&mut self, events: &[MappedEvent]) {
        self.audio_queue = events.to_vec();
    }

    fn record(
        &mut self,
        status: RecordStatus,
        armed_instruments: &[InstrumentId],
        audio_files: &[PathBuf],
    ) -> Result<()> {
        if !self.initialised {
            return Err(DriverError::NotInitialised);
        }
        match status {
            RecordStatus::RecordOn => {
                tracing::debug!(
                    armed = armed_instruments.len(),
                    files = audio_files.len(),
                    "dummy driver recording"
                );
                self.recording = true;
            }
            RecordStatus::RecordOff => self.recording = false,
            RecordStatus::AsynchronousOn | RecordStatus::AsynchronousOff => {}
        }
        Ok(())
    }

    fn drain_incoming(&mut self) -> MappedEventList {
        let mut list = MappedEventList::new();
        self.input.drain_into(&mut list);
        list
    }

    fn instrument_play_latency(&self, instrument: InstrumentId) -> RealTime {
        self.instrument_latencies
            .get(&instrument)
            .copied()
            .unwrap_or(RealTime::ZERO)
    }

    fn maximum_play_latency(&self) -> RealTime {
        self.instrument_latencies
            .values()
            .copied()
            .max()
            .unwrap_or(RealTime::ZERO)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_midi_clock_interval(&mut self, interval: RealTime) {
        self.midi_clock_interval = interval;
    }

    fn set_low_latency_mode(&mut self, enabled: bool) {
        self.low_latency = enabled;
    }

    fn timers(&self) -> Vec<String> {
        vec!["soft".to_string()]
    }

    fn current_timer(&self) -> String {
        "soft".to_string()
    }

    fn add_audio_file(&mut self, path: &Path, id: u32) -> Result<()> {
        if !path.exists() {
            return Err(DriverError::AudioFile {
                id,
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        self.audio_files.insert(id, path.to_path_buf());
        Ok(())
    }

    fn remove_audio_file(&mut self, id: u32) -> Result<()> {
        self.audio_files
            .remove(&id)
            .map(|_| ())
            .ok_or(DriverError::AudioFileNotFound { id })
    }

    fn clear_audio_files(&mut self) {
        self.audio_files.clear();
    }

    fn can_reconnect(&self, device_type: DeviceType) -> bool {
        device_type == DeviceType::Midi
    }

    fn add_device(
        &mut self,
        device_type: DeviceType,
        id: DeviceId,
        base_instrument: InstrumentId,
        direction: DeviceDirection,
    ) -> Result<()> {
        if self.devices.contains_key(&id) {
            return Err(DriverError::Device {
                id,
                reason: "already exists".to_string(),
            });
        }
        self.devices.insert(
            id,
            DeviceInfo {
                id,
                device_type,
                direction,
                base_instrument,
                name: format!("Device {id}"),
                connection: None,
            },
        );
        Ok(())
    }

    fn remove_device(&mut self, id: DeviceId) {
        self.devices.remove(&id);
    }

    fn remove_all_devices(&mut self) {
        self.devices.clear();
    }

    fn rename_device(&mut self, id: DeviceId, name: &str) {
        if let Some(device) = self.devices.get_mut(&id) {
            device.name = name.to_string();
        }
    }

    fn connection_count(&self, device_type: DeviceType, direction: DeviceDirection) -> usize {
        Self::candidates(device_type, direction).len()
    }

    fn connection(
        &self,
        device_type: DeviceType,
        direction: DeviceDirection,
        index: usize,
    ) -> Option<String> {
        Self::candidates(device_type, direction)
            .get(index)
            .map(|s| s.to_string())
    }

    fn device_connection(&self, id: DeviceId) -> Option<String> {
        self.devices.get(&id).and_then(|d| d.connection.clone())
    }

    fn set_connection(&mut self, id: DeviceId, connection: &str) {
        if let Some(device) = self.devices.get_mut(&id) {
            device.connection = (!connection.is_empty()).then(|| connection.to_string());
        }
    }

    fn set_plausible_connection(&mut self, id: DeviceId, connection: &str) {
        let Some(device) = self.devices.get_mut(&id) else {
            return;
        };
        let candidates = Self::candidates(device.device_type, device.direction);
        let wanted = connection.to_lowercase();
        let chosen = candidates
            .iter()
            .find(|c| **c == connection)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|c| !wanted.is_empty() && c.to_lowercase().contains(&wanted))
            })
            .or_else(|| candidates.first());
        device.connection = chosen.map(|c| c.to_string());
    }

    fn connect_something(&mut self) {
        for device in self.devices.values_mut() {
            if device.connection.is_none() {
                device.connection = Self::candidates(device.device_type, device.direction)
                    .first()
                    .map(|c| c.to_string());
            }
        }
    }

    fn set_mapped_instrument(&mut self, instrument: MappedInstrument) {
        self.mapped_instruments.insert(instrument.id, instrument);
    }

    fn set_studio(&mut self, studio: Arc<Studio>) {
        self.studio = Some(studio);
    }
}
