//! Engine configuration.

use crate::{Error, Result};
use rondo_core::{BufferSizes, RealTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the transport engine and its sequencer thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial look-ahead and audio buffering applied at construction.
    pub read_ahead: RealTime,
    pub audio_mix: RealTime,
    pub audio_read: RealTime,
    pub audio_write: RealTime,
    pub small_file_size: u32,
    /// Sleep between sequencer thread cycles.
    pub tick_interval: Duration,
    /// How often to poll the driver for new clients while stopped.
    pub client_check_interval: Duration,
    /// Version string callers must present to get `VERSION_OK`.
    pub gui_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let sizes = BufferSizes::default();
        Self {
            read_ahead: sizes.read_ahead,
            audio_mix: sizes.audio_mix,
            audio_read: sizes.audio_read,
            audio_write: sizes.audio_write,
            small_file_size: sizes.small_file_size,
            tick_interval: Duration::from_millis(10),
            client_check_interval: Duration::from_secs(1),
            gui_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl EngineConfig {
    pub fn buffer_sizes(&self) -> BufferSizes {
        BufferSizes {
            read_ahead: self.read_ahead,
            audio_mix: self.audio_mix,
            audio_read: self.audio_read,
            audio_write: self.audio_write,
            small_file_size: self.small_file_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.buffer_sizes()
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if self.tick_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.read_ahead, RealTime::from_millis(80));
        assert_eq!(config.small_file_size, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_buffer() {
        let config = EngineConfig {
            audio_write: RealTime::from_millis(-5),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let config = EngineConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "gui_version": "9.9", "small_file_size": 64 }"#).unwrap();
        assert_eq!(config.gui_version, "9.9");
        assert_eq!(config.small_file_size, 64);
        assert_eq!(config.read_ahead, RealTime::from_millis(80));

        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
