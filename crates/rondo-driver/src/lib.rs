//! Sound driver boundary for the rondo transport engine.
//!
//! The engine talks to audio/MIDI hardware only through [`SoundDriver`]. One
//! concrete implementation is selected at startup and injected into the
//! engine builder:
//!
//! - [`DummyDriver`]: soft clock, no hardware, SPSC input port for injected events
//! - `MockDriver` (feature `mock`): logs every call against a manual clock
//!
//! ```
//! use rondo_driver::{DummyDriver, SoundDriver};
//!
//! let mut driver = DummyDriver::new();
//! driver.initialise().unwrap();
//! assert!(driver.status().is_available());
//! ```

pub mod error;
pub use error::{DriverError, Result};

mod driver;
pub use driver::{
    DeviceDirection, DeviceInfo, DeviceType, DriverStatus, ExternalTransport, InstrumentType,
    MappedInstrument, SoundDriver,
};

mod input;
pub use input::{InputPort, InputProducer};

mod dummy;
pub use dummy::DummyDriver;

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{DriverCall, MockDriver, MockHandle};
