//! Process-wide engine accessor.
//!
//! Prefer passing the `Arc<TransportEngine>` from the composition root. This
//! exists for callers that cannot be handed one, such as driver callbacks
//! registered with C libraries.

use crate::builder::TransportEngineBuilder;
use crate::engine::TransportEngine;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

static INSTANCE: Mutex<Option<Arc<TransportEngine>>> = Mutex::new(None);

/// Build and register the process-wide engine. Fails with
/// [`Error::AlreadyInstalled`] if one is registered.
pub fn install(builder: TransportEngineBuilder) -> Result<Arc<TransportEngine>> {
    let mut slot = INSTANCE.lock();
    if slot.is_some() {
        return Err(Error::AlreadyInstalled);
    }
    let engine = builder.build()?;
    *slot = Some(Arc::clone(&engine));
    Ok(engine)
}

/// Return the registered engine, building it with `make` on first use.
pub fn get_or_install(
    make: impl FnOnce() -> TransportEngineBuilder,
) -> Result<Arc<TransportEngine>> {
    if let Some(engine) = instance() {
        return Ok(engine);
    }
    let mut slot = INSTANCE.lock();
    if let Some(engine) = slot.as_ref() {
        return Ok(Arc::clone(engine));
    }
    let engine = make().build()?;
    *slot = Some(Arc::clone(&engine));
    Ok(engine)
}

pub fn instance() -> Option<Arc<TransportEngine>> {
    INSTANCE.lock().clone()
}

/// Unregister the engine. It is dropped once the last handle goes.
pub fn uninstall() -> Option<Arc<TransportEngine>> {
    INSTANCE.lock().take()
}
