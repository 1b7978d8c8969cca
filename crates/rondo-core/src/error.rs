//! Error types for rondo-core.

use crate::RealTime;
use thiserror::Error;

/// Error type for rondo-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Negative duration for {name}: {value}")]
    NegativeDuration { name: &'static str, value: RealTime },

    #[error("Unknown transport status code: {0}")]
    UnknownStatus(u8),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
