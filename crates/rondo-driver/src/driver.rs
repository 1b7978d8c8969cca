//! The [`SoundDriver`] capability trait and the value types that cross it.

use crate::error::{DriverError, Result};
use core::ops::{BitOr, BitOrAssign};
use rondo_core::{
    BufferSizes, DeviceId, InstrumentId, LoopRange, MappedEvent, MappedEventList, RealTime,
    RecordStatus, TransportRequest,
};
use rondo_studio::Studio;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Capability bits reported by [`SoundDriver::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DriverStatus(pub u32);

impl DriverStatus {
    pub const NO_DRIVER: DriverStatus = DriverStatus(0);
    pub const AUDIO_OK: DriverStatus = DriverStatus(1 << 0);
    pub const MIDI_OK: DriverStatus = DriverStatus(1 << 1);
    pub const VERSION_OK: DriverStatus = DriverStatus(1 << 2);

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn contains(self, other: DriverStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_available(self) -> bool {
        self.contains(Self::AUDIO_OK) || self.contains(Self::MIDI_OK)
    }
}

impl BitOr for DriverStatus {
    type Output = DriverStatus;

    fn bitor(self, other: DriverStatus) -> DriverStatus {
        DriverStatus(self.0 | other.0)
    }
}

impl BitOrAssign for DriverStatus {
    fn bitor_assign(&mut self, other: DriverStatus) {
        self.0 |= other.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Midi,
    SoftSynth,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceDirection {
    Play,
    Record,
}

/// Instrument kind announced to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    Midi,
    Audio,
    SoftSynth,
}

/// Binds an instrument id to a channel on the driver side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappedInstrument {
    pub instrument_type: InstrumentType,
    pub channel: u8,
    pub id: InstrumentId,
}

/// Device record kept by drivers that manage devices in software.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub device_type: DeviceType,
    pub direction: DeviceDirection,
    pub base_instrument: InstrumentId,
    pub name: String,
    pub connection: Option<String>,
}

/// Transport control surface a driver can call back into, e.g. when an
/// external sync source asks the sequencer to start or locate.
pub trait ExternalTransport: Send + Sync {
    /// Queue a request. Returns the token that will mark its completion.
    fn transport_change(&self, request: TransportRequest) -> u64;
    /// Queue a request carrying a target time.
    fn transport_jump(&self, request: TransportRequest, time: RealTime) -> u64;
    fn is_transport_sync_complete(&self, token: u64) -> bool;
}

/// Boundary to the audio/MIDI subsystem.
///
/// Every call is synchronous and made with the engine lock held. Methods with
/// default bodies are optional capabilities; a driver without the capability
/// simply keeps the default.
pub trait SoundDriver: Send {
    fn name(&self) -> &str;

    /// Bring the driver up. An `Err` leaves the engine in its terminal state.
    fn initialise(&mut self) -> Result<()>;

    fn shutdown(&mut self) {}

    fn status(&self) -> DriverStatus;

    fn status_log(&self) -> String {
        String::new()
    }

    // --- playback ---------------------------------------------------------

    /// Prepare playback from `position`. Marks the driver as playing.
    fn initialise_playback(&mut self, position: RealTime);

    /// Flush pending note-offs, drop queued events and mark the driver stopped.
    fn stop_playback(&mut self);

    /// Stop capture while playback continues.
    fn punch_out(&mut self);

    /// Relocate the running playback from `old_position` to `new_position`.
    fn reset_playback(&mut self, old_position: RealTime, new_position: RealTime);

    fn start_clocks(&mut self);

    fn stop_clocks(&mut self);

    /// True between `initialise_playback` and `stop_playback`.
    fn is_playing(&self) -> bool;

    fn set_audio_buffer_sizes(&mut self, sizes: &BufferSizes);

    fn set_loop(&mut self, range: LoopRange);

    /// Authoritative song time of the running clock.
    fn sequencer_time(&self) -> RealTime;

    /// Song time at which the current playback began.
    fn start_position(&self) -> RealTime;

    /// Queue events due in `[window_start, window_end)` for timed emission.
    /// Called every tick while playing, even with an empty list, so the driver
    /// can service its audio queue.
    fn process_events_out(
        &mut self,
        events: &MappedEventList,
        window_start: RealTime,
        window_end: RealTime,
    );

    /// Emit events immediately, outside the timed pipeline.
    fn process_events_now(&mut self, events: &MappedEventList);

    /// Emit due note-offs and service audio outside the playback pipeline.
    fn process_pending(&mut self) {}

    /// Seed the audio queue with every known audio event.
    fn initialise_audio_queue(&mut self, events: &[MappedEvent]);

    /// Housekeeping hook, called once per engine tick in every state.
    fn run_tasks(&mut self) {}

    // --- recording --------------------------------------------------------

    /// Arm or disarm capture. `audio_files` carries one file per armed audio instrument.
    fn record(
        &mut self,
        status: RecordStatus,
        armed_instruments: &[InstrumentId],
        audio_files: &[PathBuf],
    ) -> Result<()>;

    /// Take every event received since the last call.
    fn drain_incoming(&mut self) -> MappedEventList;

    // --- latency and clocking ---------------------------------------------

    fn instrument_play_latency(&self, _instrument: InstrumentId) -> RealTime {
        RealTime::ZERO
    }

    fn maximum_play_latency(&self) -> RealTime {
        RealTime::ZERO
    }

    fn audio_play_latency(&self) -> RealTime {
        RealTime::ZERO
    }

    fn audio_record_latency(&self) -> RealTime {
        RealTime::ZERO
    }

    fn sample_rate(&self) -> u32 {
        0
    }

    fn set_midi_clock_interval(&mut self, _interval: RealTime) {}

    fn set_low_latency_mode(&mut self, _enabled: bool) {}

    fn timers(&self) -> Vec<String> {
        Vec::new()
    }

    fn current_timer(&self) -> String {
        String::new()
    }

    fn set_current_timer(&mut self, _name: &str) {}

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    // --- audio files --------------------------------------------------------

    fn add_audio_file(&mut self, path: &Path, id: u32) -> Result<()>;

    fn remove_audio_file(&mut self, id: u32) -> Result<()>;

    fn clear_audio_files(&mut self);

    // --- devices and connections --------------------------------------------

    fn can_reconnect(&self, _device_type: DeviceType) -> bool {
        false
    }

    fn add_device(
        &mut self,
        _device_type: DeviceType,
        _id: DeviceId,
        _base_instrument: InstrumentId,
        _direction: DeviceDirection,
    ) -> Result<()> {
        Err(DriverError::Unsupported("add_device"))
    }

    fn remove_device(&mut self, _id: DeviceId) {}

    fn remove_all_devices(&mut self) {}

    fn rename_device(&mut self, _id: DeviceId, _name: &str) {}

    fn connection_count(&self, _device_type: DeviceType, _direction: DeviceDirection) -> usize {
        0
    }

    fn connection(
        &self,
        _device_type: DeviceType,
        _direction: DeviceDirection,
        _index: usize,
    ) -> Option<String> {
        None
    }

    fn device_connection(&self, _id: DeviceId) -> Option<String> {
        None
    }

    fn set_connection(&mut self, _id: DeviceId, _connection: &str) {}

    /// Connect to the best match for `connection`, or anything plausible.
    fn set_plausible_connection(&mut self, _id: DeviceId, _connection: &str) {}

    fn connect_something(&mut self) {}

    /// Returns true if the set of available clients changed.
    fn check_for_new_clients(&mut self) -> bool {
        false
    }

    fn set_mapped_instrument(&mut self, _instrument: MappedInstrument) {}

    // --- collaborators ------------------------------------------------------

    /// Share the mapped object registry with the driver.
    fn set_studio(&mut self, _studio: Arc<Studio>) {}

    fn set_external_transport(&mut self, _transport: Arc<dyn ExternalTransport>) {}

    fn plugin_information(&self) -> Vec<String> {
        Vec::new()
    }
}
