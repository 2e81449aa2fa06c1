//! Host configuration.
//!
//! Loaded from TOML; every key is optional and falls back to its default.
//!
//! ```toml
//! max_string_len = 128
//! max_features_per_device = 256
//! reregistration = "reject"   # or "replace"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::device::{DefinitionLimits, DEFAULT_MAX_FEATURES, XR_STRING_SIZE};
use crate::manager::ReregistrationPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tunables of a [`Manager`](crate::manager::Manager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Exclusive upper bound on definition string lengths, in bytes.
    pub max_string_len: usize,
    /// Features one device may declare before `add_feature` starts failing.
    pub max_features_per_device: usize,
    /// What a second `register_input_provider` on the same subsystem does.
    pub reregistration: ReregistrationPolicy,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_string_len: XR_STRING_SIZE,
            max_features_per_device: DEFAULT_MAX_FEATURES,
            reregistration: ReregistrationPolicy::default(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: HostConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_string_len < 2 {
            return Err(ConfigError::Invalid("max_string_len must be at least 2"));
        }
        if self.max_features_per_device == 0 {
            return Err(ConfigError::Invalid("max_features_per_device must be non-zero"));
        }
        Ok(())
    }

    pub(crate) fn definition_limits(&self) -> DefinitionLimits {
        DefinitionLimits {
            max_string_len: self.max_string_len,
            max_features: self.max_features_per_device,
        }
    }
}
