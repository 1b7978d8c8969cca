//! Timestamped events exchanged between the event source, the transport
//! engine and the sound driver.

use crate::RealTime;
use core::ops::{BitOr, BitOrAssign};
use serde::{Deserialize, Serialize};

pub type InstrumentId = u32;
pub type DeviceId = u32;

/// First audio instrument id. Audio instruments occupy `1000..2000`.
pub const AUDIO_INSTRUMENT_BASE: InstrumentId = 1000;
/// First MIDI instrument id. MIDI instruments occupy `2000..10000`.
pub const MIDI_INSTRUMENT_BASE: InstrumentId = 2000;
/// First soft-synth instrument id.
pub const SOFT_SYNTH_INSTRUMENT_BASE: InstrumentId = 10000;

pub const NO_DEVICE: DeviceId = 10000;
pub const ALL_DEVICES: DeviceId = 10001;
/// Device tag carried by events that arrive from a control surface.
pub const CONTROL_DEVICE: DeviceId = 10002;

#[inline]
pub fn is_audio_instrument(id: InstrumentId) -> bool {
    (AUDIO_INSTRUMENT_BASE..MIDI_INSTRUMENT_BASE).contains(&id)
}

#[inline]
pub fn is_midi_instrument(id: InstrumentId) -> bool {
    (MIDI_INSTRUMENT_BASE..SOFT_SYNTH_INSTRUMENT_BASE).contains(&id)
}

/// Event kind. Each kind owns one bit so kinds can be combined into a [`MidiFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum MappedEventType {
    #[default]
    Invalid = 0,
    MidiNote = 1 << 0,
    MidiNoteOneShot = 1 << 1,
    MidiProgramChange = 1 << 2,
    MidiKeyPressure = 1 << 3,
    MidiChannelPressure = 1 << 4,
    MidiPitchBend = 1 << 5,
    MidiController = 1 << 6,
    MidiSystemMessage = 1 << 7,
    Audio = 1 << 8,
    AudioCancel = 1 << 9,
    AudioLevel = 1 << 10,
    AudioStopped = 1 << 11,
    AudioGeneratePreview = 1 << 12,
    SystemUpdateInstruments = 1 << 13,
    SystemFailure = 1 << 14,
    Tempo = 1 << 15,
    TimeSignature = 1 << 16,
    Marker = 1 << 17,
    Panic = 1 << 18,
}

impl MappedEventType {
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn is_midi(self) -> bool {
        self.bits() & 0xff != 0
    }

    #[inline]
    pub fn is_audio(self) -> bool {
        matches!(self, MappedEventType::Audio)
    }
}

/// Bitmask of [`MappedEventType`]s to drop from a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MidiFilter(pub u32);

impl MidiFilter {
    pub const NONE: MidiFilter = MidiFilter(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn matches(self, kind: MappedEventType) -> bool {
        self.0 & kind.bits() != 0
    }

    pub fn with(self, kind: MappedEventType) -> Self {
        Self(self.0 | kind.bits())
    }
}

impl From<MappedEventType> for MidiFilter {
    fn from(kind: MappedEventType) -> Self {
        Self(kind.bits())
    }
}

impl BitOr<MappedEventType> for MidiFilter {
    type Output = MidiFilter;

    fn bitor(self, kind: MappedEventType) -> MidiFilter {
        self.with(kind)
    }
}

impl BitOr for MidiFilter {
    type Output = MidiFilter;

    fn bitor(self, other: MidiFilter) -> MidiFilter {
        MidiFilter(self.0 | other.0)
    }
}

impl BitOrAssign<MappedEventType> for MidiFilter {
    fn bitor_assign(&mut self, kind: MappedEventType) {
        self.0 |= kind.bits();
    }
}

/// A timestamped musical or control event addressed to an instrument.
///
/// For audio events `data1`/`data2` carry the low/high byte of the audio file id
/// and `audio_start_marker` the offset into that file. Inbound events carry the
/// device and channel they were recorded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MappedEvent {
    pub instrument: InstrumentId,
    pub event_type: MappedEventType,
    pub data1: u8,
    pub data2: u8,
    pub event_time: RealTime,
    pub duration: RealTime,
    pub audio_start_marker: RealTime,
    pub recorded_channel: u8,
    pub recorded_device: DeviceId,
}

impl MappedEvent {
    pub fn new(
        instrument: InstrumentId,
        event_type: MappedEventType,
        data1: u8,
        data2: u8,
        event_time: RealTime,
        duration: RealTime,
    ) -> Self {
        Self {
            instrument,
            event_type,
            data1,
            data2,
            event_time,
            duration,
            audio_start_marker: RealTime::ZERO,
            recorded_channel: 0,
            recorded_device: NO_DEVICE,
        }
    }

    pub fn note(
        instrument: InstrumentId,
        pitch: u8,
        velocity: u8,
        event_time: RealTime,
        duration: RealTime,
    ) -> Self {
        Self::new(
            instrument,
            MappedEventType::MidiNote,
            pitch,
            velocity,
            event_time,
            duration,
        )
    }

    pub fn controller(instrument: InstrumentId, controller: u8, value: u8, event_time: RealTime) -> Self {
        Self::new(
            instrument,
            MappedEventType::MidiController,
            controller,
            value,
            event_time,
            RealTime::ZERO,
        )
    }

    pub fn program_change(instrument: InstrumentId, program: u8, event_time: RealTime) -> Self {
        Self::new(
            instrument,
            MappedEventType::MidiProgramChange,
            program,
            0,
            event_time,
            RealTime::ZERO,
        )
    }

    pub fn audio(
        instrument: InstrumentId,
        audio_file_id: u16,
        event_time: RealTime,
        duration: RealTime,
        start_marker: RealTime,
    ) -> Self {
        let [lo, hi] = audio_file_id.to_le_bytes();
        Self {
            audio_start_marker: start_marker,
            ..Self::new(instrument, MappedEventType::Audio, lo, hi, event_time, duration)
        }
    }

    /// Tag an inbound event with its originating device and channel.
    pub fn recorded_from(mut self, device: DeviceId, channel: u8) -> Self {
        self.recorded_device = device;
        self.recorded_channel = channel;
        self
    }

    pub fn at(mut self, event_time: RealTime) -> Self {
        self.event_time = event_time;
        self
    }

    #[inline]
    pub fn end_time(&self) -> RealTime {
        self.event_time + self.duration
    }

    #[inline]
    pub fn is_audio(&self) -> bool {
        self.event_type.is_audio()
    }

    pub fn audio_file_id(&self) -> Option<u16> {
        self.is_audio()
            .then(|| u16::from_le_bytes([self.data1, self.data2]))
    }
}
