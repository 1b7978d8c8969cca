//! Error types for sound drivers.

use rondo_core::DeviceId;
use std::path::PathBuf;
use thiserror::Error;

/// Driver error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// No usable audio/MIDI subsystem.
    #[error("Driver unavailable: {0}")]
    Unavailable(String),

    #[error("Driver not initialised")]
    NotInitialised,

    /// Record-start rejected by the driver.
    #[error("Recording rejected: {0}")]
    RecordRejected(String),

    #[error("Audio file {id} not registered")]
    AudioFileNotFound { id: u32 },

    #[error("Audio file {id} could not be added from {path:?}: {reason}")]
    AudioFile {
        id: u32,
        path: PathBuf,
        reason: String,
    },

    #[error("Device error ({id}): {reason}")]
    Device { id: DeviceId, reason: String },

    #[error("Operation not supported by this driver: {0}")]
    Unsupported(&'static str),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, DriverError>;
