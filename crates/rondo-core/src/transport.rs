//! Transport state, requests and playback parameters.

use crate::error::{Error, Result};
use crate::RealTime;
use serde::{Deserialize, Serialize};

/// Sequencer transport state.
///
/// `Starting` and `StartingToRecord` are transient: the next sequencer tick
/// completes them into `Playing` and `Recording`. `Stopping` completes into
/// `Stopped`. `Quit` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransportStatus {
    #[default]
    Stopped,
    Starting,
    Playing,
    StartingToRecord,
    Recording,
    Stopping,
    Quit,
}

impl TransportStatus {
    pub fn to_u8(self) -> u8 {
        match self {
            TransportStatus::Stopped => 0,
            TransportStatus::Starting => 1,
            TransportStatus::Playing => 2,
            TransportStatus::StartingToRecord => 3,
            TransportStatus::Recording => 4,
            TransportStatus::Stopping => 5,
            TransportStatus::Quit => 6,
        }
    }

    pub fn from_u8(val: u8) -> Result<Self> {
        Ok(match val {
            0 => TransportStatus::Stopped,
            1 => TransportStatus::Starting,
            2 => TransportStatus::Playing,
            3 => TransportStatus::StartingToRecord,
            4 => TransportStatus::Recording,
            5 => TransportStatus::Stopping,
            6 => TransportStatus::Quit,
            other => return Err(Error::UnknownStatus(other)),
        })
    }

    /// `Playing` or `Recording`.
    #[inline]
    pub fn is_rolling(self) -> bool {
        matches!(self, TransportStatus::Playing | TransportStatus::Recording)
    }

    #[inline]
    pub fn is_stopped(self) -> bool {
        matches!(self, TransportStatus::Stopped | TransportStatus::Stopping)
    }

    pub fn is_recording(self) -> bool {
        matches!(
            self,
            TransportStatus::Recording | TransportStatus::StartingToRecord
        )
    }
}

impl TryFrom<u8> for TransportStatus {
    type Error = Error;

    fn try_from(val: u8) -> Result<Self> {
        Self::from_u8(val)
    }
}

/// Transport operation requested from outside the sequencer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportRequest {
    NoChange,
    Stop,
    Start,
    Record,
    Jump,
    StartAtTime,
    StopAtTime,
}

/// Argument passed to the driver when arming or disarming capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    RecordOff,
    RecordOn,
    AsynchronousOff,
    AsynchronousOn,
}

/// Loop region in real time. Looping is active iff `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoopRange {
    pub start: RealTime,
    pub end: RealTime,
}

impl LoopRange {
    pub fn new(start: RealTime, end: RealTime) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.end > self.start
    }

    pub fn length(&self) -> RealTime {
        if self.is_active() {
            self.end - self.start
        } else {
            RealTime::ZERO
        }
    }
}

/// Look-ahead and audio buffering spans used while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSizes {
    pub read_ahead: RealTime,
    pub audio_mix: RealTime,
    pub audio_read: RealTime,
    pub audio_write: RealTime,
    /// Audio files at or below this size (KB) are preloaded whole.
    pub small_file_size: u32,
}

impl Default for BufferSizes {
    fn default() -> Self {
        Self {
            read_ahead: RealTime::from_millis(80),
            audio_mix: RealTime::from_millis(60),
            audio_read: RealTime::from_millis(100),
            audio_write: RealTime::from_millis(200),
            small_file_size: 128,
        }
    }
}

impl BufferSizes {
    /// A zero read-ahead is replaced by one second.
    pub fn normalised(mut self) -> Self {
        if self.read_ahead.is_zero() {
            self.read_ahead = RealTime::new(1, 0);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("read_ahead", self.read_ahead),
            ("audio_mix", self.audio_mix),
            ("audio_read", self.audio_read),
            ("audio_write", self.audio_write),
        ] {
            if value.is_negative() {
                return Err(Error::NegativeDuration { name, value });
            }
        }
        Ok(())
    }
}
