//! Configuration for schema construction
//!
//! [`SchemaConfig`] decides how the registry builds schemas: which engine, which
//! code shape for compiled plans, and how field access is chosen. It is stored
//! as TOML and supports:
//! - Auto-generation of a default file
//! - Manual reload
//! - A process-wide current config read by the registry
//!
//! # Example
//!
//! ```ignore
//! use protoschema_core::config::{self, SchemaConfig};
//!
//! let config = SchemaConfig::load(config::config_path())?;
//! config::set_current(config);
//! ```
//!
//! ```toml
//! version = 1
//! debug = false
//! strategy = "compiled"
//! code_shape = "inline"
//! prefer_offset_access = false
//! offset_access = true
//! ```

mod loader;

use std::path::Path;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::access::AccessPolicy;

pub use loader::{config_path, CONFIG_ENV, DEFAULT_CONFIG_FILE};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Schema engine used by the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Interpret the field table per call
    #[default]
    Generic,
    /// Build a per-type plan of field closures once
    Compiled,
    /// Use the code emitted by `#[derive(Message)]`; types without it fall
    /// back to `Generic`
    Specialized,
}

/// Shape of generated per-field code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeShape {
    /// Each field calls a shared helper routine
    #[default]
    Compact,
    /// Each field carries its own expanded sequence
    Inline,
}

impl CodeShape {
    pub const fn name(self) -> &'static str {
        match self {
            CodeShape::Compact => "compact",
            CodeShape::Inline => "inline",
        }
    }
}

/// Schema construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Engine the registry builds
    pub strategy: Strategy,

    /// Code shape for compiled plans
    pub code_shape: CodeShape,

    /// Use offset access even where a direct accessor exists
    pub prefer_offset_access: bool,

    /// Allow offset access at all
    pub offset_access: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            strategy: Strategy::Generic,
            code_shape: CodeShape::Compact,
            prefer_offset_access: false,
            offset_access: true,
        }
    }
}

impl SchemaConfig {
    /// Access selection rules derived from this config
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            prefer_offset: self.prefer_offset_access,
            offset_supported: self.offset_access,
        }
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file, creating default if missing.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded schema config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default schema config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved schema config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded schema config from {:?}", path);
        Ok(())
    }
}

static CURRENT: LazyLock<RwLock<SchemaConfig>> =
    LazyLock::new(|| RwLock::new(SchemaConfig::default()));

/// Config the registry builds new schemas with
pub fn current() -> SchemaConfig {
    CURRENT.read().clone()
}

/// Replace the process-wide config
///
/// Schemas already in the registry keep the settings they were built with;
/// call [`clear_cache`](crate::schema::clear_cache) to rebuild them.
pub fn set_current(config: SchemaConfig) {
    *CURRENT.write() = config;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SchemaConfig::default();
        assert_eq!(config.version, 1);
        assert!(!config.debug);
        assert_eq!(config.strategy, Strategy::Generic);
        assert_eq!(config.code_shape, CodeShape::Compact);
        assert_eq!(config.access_policy(), AccessPolicy::default());
    }

    #[test]
    fn test_config_serialize() {
        let config = SchemaConfig {
            strategy: Strategy::Compiled,
            code_shape: CodeShape::Inline,
            prefer_offset_access: true,
            ..SchemaConfig::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("strategy = \"compiled\""));
        assert!(toml_str.contains("code_shape = \"inline\""));
        assert!(toml_str.contains("prefer_offset_access = true"));

        let parsed = SchemaConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = SchemaConfig::from_toml_str("offset_access = false\n").unwrap();
        assert!(!config.offset_access);
        assert_eq!(config.version, 1);
        assert_eq!(config.strategy, Strategy::Generic);

        let policy = config.access_policy();
        assert!(!policy.offset_supported);
    }

    #[test]
    fn test_specialized_strategy_parses() {
        let config = SchemaConfig::from_toml_str("strategy = \"specialized\"\n").unwrap();
        assert_eq!(config.strategy, Strategy::Specialized);
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        let err = SchemaConfig::from_toml_str("strategy = \"jit\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("protoschema.toml");

        let config = SchemaConfig::load(&path).unwrap();
        assert_eq!(config, SchemaConfig::default());
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("strategy = \"generic\""));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("protoschema.toml");

        let mut config = SchemaConfig::load(&path).unwrap();
        let updated = SchemaConfig {
            debug: true,
            strategy: Strategy::Compiled,
            ..SchemaConfig::default()
        };
        updated.save(&path).unwrap();

        config.reload(&path).unwrap();
        assert_eq!(config, updated);
    }

    #[test]
    fn test_reload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SchemaConfig::default();
        let err = config.reload(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
