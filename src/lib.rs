//! # Rondo - Real-time Transport Engine
//!
//! Play, record, loop and locate over a set of event segments, feeding a
//! sound driver one read-ahead window at a time.
//!
//! ## Architecture
//!
//! Rondo is an umbrella crate that coordinates:
//! - **rondo-core** - Time and event value types, transport enums, buffer sizes
//! - **rondo-studio** - Mapped object registry (faders, busses, inputs, plugin slots)
//! - **rondo-driver** - `SoundDriver` trait, `DummyDriver`, and a call-logging mock
//!
//! and adds the transport engine itself: the state machine, the fetch and
//! latency compensation pipeline, the segment iterator, the async relay,
//! MIDI routing, and the sequencer thread that ticks it all.
//!
//! ## Quick Start
//!
//! ```
//! use rondo::prelude::*;
//!
//! let engine = TransportEngine::builder()
//!     .driver(DummyDriver::new())
//!     .build()?;
//!
//! let segment = MappedSegment::new([MappedEvent::note(
//!     MIDI_INSTRUMENT_BASE,
//!     60,
//!     100,
//!     RealTime::ZERO,
//!     RealTime::from_millis(500),
//! )]);
//! engine.segment_added(&segment);
//!
//! let mut sequencer = SequencerThread::new(engine.clone());
//! sequencer.start()?;
//!
//! engine.play(RealTime::ZERO, BufferSizes::default());
//! engine.stop();
//! sequencer.stop();
//! # Ok::<(), rondo::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::EngineConfig;

pub mod engine;
pub use engine::{compensate_latency, TransportEngine};

mod builder;
pub use builder::TransportEngineBuilder;

pub mod global;

pub mod host;
pub use host::{ArmedInstruments, NoRecordHost, RecordHost};

pub mod meta_iterator;
pub use meta_iterator::{MappedSegment, MetaIterator, SegmentId};

pub mod monitor;
pub use monitor::PlaybackMonitor;

pub mod relay;
pub use relay::AsyncRelay;

pub mod routing;
pub use routing::{apply_filter, RoutingSnapshot, RoutingTable, TrackId};

mod thread;
pub use thread::{SequencerCommand, SequencerThread};

pub mod transport_sync;
pub use transport_sync::TransportSync;

/// Re-export of rondo-core for direct access
pub use rondo_core as core;
/// Re-export of rondo-driver for direct access
pub use rondo_driver as driver;
/// Re-export of rondo-studio for direct access
pub use rondo_studio as studio;

pub use rondo_core::{
    BufferSizes, InstrumentId, LoopRange, MappedEvent, MappedEventList, MappedEventType,
    MidiFilter, RealTime, RecordStatus, TransportRequest, TransportStatus,
};
pub use rondo_driver::{DriverStatus, DummyDriver, ExternalTransport, SoundDriver};
pub use rondo_studio::{MappedObjectType, ObjectId, PropertyValue, Studio};

pub mod prelude {
    pub use crate::{
        AsyncRelay, EngineConfig, Error, MappedSegment, PlaybackMonitor, RecordHost, Result,
        SequencerThread, TransportEngine, TransportEngineBuilder,
    };

    pub use rondo_core::{
        BufferSizes, LoopRange, MappedEvent, MappedEventList, MappedEventType, MidiFilter,
        RealTime, TransportRequest, TransportStatus, AUDIO_INSTRUMENT_BASE, MIDI_INSTRUMENT_BASE,
    };

    pub use rondo_driver::{DriverStatus, DummyDriver, ExternalTransport, SoundDriver};

    pub use rondo_studio::{property, MappedObjectType, PropertyValue, Studio};
}
