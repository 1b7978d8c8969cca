//! Value types shared by every part of the rondo transport engine.
//!
//! - [`RealTime`]: signed seconds/nanoseconds time value
//! - [`MappedEvent`] / [`MappedEventList`]: timestamped events and the
//!   time-ordered multiset that carries them between components
//! - [`TransportStatus`], [`TransportRequest`], [`RecordStatus`]: transport control plane
//! - [`BufferSizes`], [`LoopRange`]: per-session playback parameters

pub mod error;
pub use error::{Error, Result};

mod time;
pub use time::RealTime;

mod event;
pub use event::{
    is_audio_instrument, is_midi_instrument, DeviceId, InstrumentId, MappedEvent,
    MappedEventType, MidiFilter, ALL_DEVICES, AUDIO_INSTRUMENT_BASE, CONTROL_DEVICE,
    MIDI_INSTRUMENT_BASE, NO_DEVICE, SOFT_SYNTH_INSTRUMENT_BASE,
};

mod event_list;
pub use event_list::MappedEventList;

mod transport;
pub use transport::{BufferSizes, LoopRange, RecordStatus, TransportRequest, TransportStatus};
