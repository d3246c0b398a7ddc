//! Core configuration
//!
//! TOML-backed settings for the I/O core, loaded from an explicit path
//! with a default file generated on first run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Framework-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Deliveries allowed per pump before a zero-delay cascade is treated
    /// as runaway and deferred to the next tick with a warning
    pub max_events_per_pump: usize,

    /// Batch size above which hierarchical spawns log a capacity warning
    pub max_spawn_batch: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            max_events_per_pump: 1024,
            max_spawn_batch: 512,
        }
    }
}

impl CoreConfig {
    /// Load from `path`, creating a default config file if missing
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            debug!("loaded core config from {path:?}");
            Ok(config)
        } else {
            let default = Self::default();
            default.save_to(path)?;
            info!("created default core config at {path:?}");
            Ok(default)
        }
    }

    /// Save to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!("saved core config to {path:?}");
        Ok(())
    }

    /// Reload from `path`, replacing self
    pub fn reload_from(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = toml::from_str(&content)?;
        debug!("reloaded core config from {path:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.version, 1);
        assert!(!config.debug);
        assert_eq!(config.max_events_per_pump, 1024);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CoreConfig {
            version: 2,
            debug: true,
            max_events_per_pump: 64,
            max_spawn_batch: 16,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: CoreConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.max_events_per_pump, 64);
        assert!(parsed.debug);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: CoreConfig = toml::from_str("debug = true\n").unwrap();
        assert!(parsed.debug);
        assert_eq!(parsed.max_events_per_pump, 1024);
    }
}
