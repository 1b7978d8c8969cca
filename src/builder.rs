//! Builder for configuring and constructing a `TransportEngine`.

use crate::config::EngineConfig;
use crate::engine::{EngineParts, TransportEngine};
use crate::host::{NoRecordHost, RecordHost};
use crate::transport_sync::TransportSync;
use crate::Result;
use rondo_core::TransportStatus;
use rondo_driver::{DummyDriver, ExternalTransport, SoundDriver};
use rondo_studio::Studio;
use std::sync::Arc;
use tracing::{info, warn};

/// The driver is the single seam to the outside world. Without one the
/// builder falls back to [`DummyDriver`].
///
/// A driver that fails to initialise does not fail the build: the engine
/// comes up in `Quit` and never plays.
///
/// # Example
///
/// ```
/// use rondo::prelude::*;
///
/// let engine = TransportEngine::builder()
///     .driver(DummyDriver::new())
///     .build()?;
///
/// assert_eq!(engine.status(), TransportStatus::Stopped);
/// # Ok::<(), rondo::Error>(())
/// ```
pub struct TransportEngineBuilder {
    driver: Option<Box<dyn SoundDriver>>,
    config: EngineConfig,
    studio: Option<Arc<Studio>>,
    host: Option<Arc<dyn RecordHost>>,
}

impl Default for TransportEngineBuilder {
    fn default() -> Self {
        Self {
            driver: None,
            config: EngineConfig::default(),
            studio: None,
            host: None,
        }
    }
}

impl TransportEngineBuilder {
    pub fn driver(mut self, driver: impl SoundDriver + 'static) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    pub fn boxed_driver(mut self, driver: Box<dyn SoundDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing studio. Default: a new, empty one.
    pub fn studio(mut self, studio: Arc<Studio>) -> Self {
        self.studio = Some(studio);
        self
    }

    /// Default: nothing is ever armed.
    pub fn record_host(mut self, host: Arc<dyn RecordHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn build(self) -> Result<Arc<TransportEngine>> {
        self.config.validate()?;

        let mut driver = self
            .driver
            .unwrap_or_else(|| Box::new(DummyDriver::new()));

        let status = match driver.initialise() {
            Ok(()) => TransportStatus::Stopped,
            Err(e) => {
                warn!(driver = driver.name(), error = %e, "sound driver unavailable, engine will not play");
                TransportStatus::Quit
            }
        };

        let studio = self.studio.unwrap_or_else(|| Arc::new(Studio::new()));
        let sync = Arc::new(TransportSync::new());

        driver.set_studio(Arc::clone(&studio));
        driver.set_external_transport(Arc::clone(&sync) as Arc<dyn ExternalTransport>);
        driver.set_audio_buffer_sizes(&self.config.buffer_sizes().normalised());

        info!(driver = driver.name(), ?status, "transport engine built");

        Ok(Arc::new(TransportEngine::from_parts(EngineParts {
            driver,
            status,
            config: self.config,
            studio,
            sync,
            host: self.host.unwrap_or_else(|| Arc::new(NoRecordHost)),
        })))
    }
}

impl TransportEngine {
    pub fn builder() -> TransportEngineBuilder {
        TransportEngineBuilder::default()
    }
}
