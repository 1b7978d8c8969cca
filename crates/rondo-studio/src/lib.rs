//! Mapped object registry ("studio") for the rondo transport engine.
//!
//! A flat, id-indexed collection of runtime objects (audio faders, busses,
//! inputs, plugin slots) with generic property get/set by name and directed
//! connection edges. Objects are a closed tagged enum ([`MappedObjectKind`]);
//! variant-specific access is a `match`, never a downcast.
//!
//! ```
//! use rondo_studio::{property, MappedObjectType, Studio};
//!
//! let studio = Studio::new();
//! let fader = studio.create(MappedObjectType::AudioFader);
//! let buss = studio.create(MappedObjectType::AudioBuss);
//! studio.set_property(fader, property::LEVEL, -6.0).unwrap();
//! studio.connect(fader, buss).unwrap();
//! ```

pub mod error;
pub use error::{Result, StudioError};

mod object;
pub use object::{
    property, AudioBuss, AudioFader, AudioInput, MappedObject, MappedObjectKind,
    MappedObjectType, ObjectId, PluginProgram, PluginSlot, PropertyValue, Strip,
};

mod studio;
pub use studio::Studio;
