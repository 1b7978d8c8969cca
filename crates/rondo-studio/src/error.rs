//! Error types for the studio registry.

use crate::{MappedObjectType, ObjectId};
use thiserror::Error;

/// Errors raised by [`Studio`](crate::Studio) operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudioError {
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Object {id} is a {actual:?}, expected {expected:?}")]
    WrongType {
        id: ObjectId,
        expected: MappedObjectType,
        actual: MappedObjectType,
    },

    #[error("{object_type:?} has no property '{name}'")]
    UnknownProperty {
        object_type: MappedObjectType,
        name: String,
    },

    #[error("Invalid value for property '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Cannot connect object {0} to itself")]
    SelfConnection(ObjectId),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, StudioError>;
