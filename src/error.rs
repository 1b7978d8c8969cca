//! Centralized error type for the rondo umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.
//! The transport API itself never returns these: play/record/stop report
//! through booleans and state, and only setup paths are fallible.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] rondo_core::Error),

    #[error("Studio: {0}")]
    Studio(#[from] rondo_studio::StudioError),

    #[error("Driver: {0}")]
    Driver(#[from] rondo_driver::DriverError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Sequencer thread: {0}")]
    Thread(String),

    #[error("Engine already installed")]
    AlreadyInstalled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
