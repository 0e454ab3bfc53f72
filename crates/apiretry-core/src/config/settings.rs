//! Loading registry configuration from files and the environment.

use super::call_override::HandlerOptions;
use super::registry::ConfigRegistry;
use crate::error::{ConfigError, Result};
use crate::key::ClassificationKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable holding the default wait in seconds.
pub const ENV_DEFAULT_WAIT: &str = "APIRETRY_DEFAULT_WAIT";

/// Environment variable holding the default maximum attempts.
pub const ENV_DEFAULT_TRIES: &str = "APIRETRY_DEFAULT_TRIES";

/// Serializable registry configuration.
///
/// ```toml
/// default_wait = 1.0
/// default_tries = 3
///
/// [on.5XX]
/// tries = 4
/// wait = 3.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySettings {
    /// Default wait in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_wait: Option<f64>,

    /// Default maximum attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tries: Option<u32>,

    /// Per-key options
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<ClassificationKey, HandlerOptions>,
}

impl RegistrySettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Read settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Settings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Load default wait and tries from environment variables.
    ///
    /// This will look for:
    /// - `APIRETRY_DEFAULT_WAIT` for the default wait (seconds)
    /// - `APIRETRY_DEFAULT_TRIES` for the default maximum attempts
    ///
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(wait_str) = std::env::var(ENV_DEFAULT_WAIT) {
            match wait_str.trim().parse::<f64>() {
                Ok(wait) => settings.default_wait = Some(wait),
                Err(_) => {
                    tracing::warn!(value = %wait_str, "ignoring unparsable {ENV_DEFAULT_WAIT}")
                }
            }
        }

        if let Ok(tries_str) = std::env::var(ENV_DEFAULT_TRIES) {
            match tries_str.trim().parse::<u32>() {
                Ok(tries) => settings.default_tries = Some(tries),
                Err(_) => {
                    tracing::warn!(value = %tries_str, "ignoring unparsable {ENV_DEFAULT_TRIES}")
                }
            }
        }

        settings
    }

    /// Merge with other settings, with the other taking precedence.
    pub fn merge(mut self, other: RegistrySettings) -> Self {
        if other.default_wait.is_some() {
            self.default_wait = other.default_wait;
        }
        if other.default_tries.is_some() {
            self.default_tries = other.default_tries;
        }
        self.on.extend(other.on);
        self
    }
}

impl ConfigRegistry {
    /// Build a registry from settings.
    ///
    /// Defaults are applied before the per-key options, so keys without a
    /// wait or tries inherit the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero default tries or a negative wait.
    pub fn from_settings(settings: &RegistrySettings) -> Result<Self> {
        let mut registry = ConfigRegistry::new();

        if let Some(tries) = settings.default_tries {
            if tries == 0 {
                return Err(ConfigError::InvalidTries {
                    key: "default_tries".to_string(),
                });
            }
            registry.set_default_tries(tries);
        }
        registry.set_default_wait(settings.default_wait);

        for (key, options) in &settings.on {
            registry.on(key.clone(), *options);
        }

        registry.snapshot().validate()?;
        Ok(registry)
    }
}
