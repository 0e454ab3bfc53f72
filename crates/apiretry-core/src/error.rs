//! Configuration error types
//!
//! Only configuration problems are reported through these types. Failures
//! raised by the unit of work are handed back to the caller untouched.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Invalid registry, settings or per-call override configuration.
///
/// These are raised before the first attempt of a call runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A wait was negative, NaN, infinite or too large to represent.
    #[error("seconds to wait must be >= 0 (got {wait} for {key:?})")]
    InvalidWait {
        /// Classification key of the offending entry
        key: String,
        /// The rejected value in seconds
        wait: f64,
    },

    /// A tries count of zero would never invoke the work.
    #[error("tries must be >= 1 (got 0 for {key:?})")]
    InvalidTries {
        /// Classification key of the offending entry
        key: String,
    },

    /// A per-call override had the wrong shape.
    #[error("Invalid retry override: {0}")]
    InvalidOverride(String),

    /// Settings could not be parsed.
    #[error("Invalid retry settings: {0}")]
    Settings(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Settings(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_wait_message() {
        let error = ConfigError::InvalidWait {
            key: "429".to_string(),
            wait: -1.0,
        };

        assert_eq!(
            error.to_string(),
            "seconds to wait must be >= 0 (got -1 for \"429\")"
        );
    }

    #[test]
    fn test_toml_error_converts_to_settings() {
        let err = toml::from_str::<toml::Value>("default_tries = [").unwrap_err();
        let error: ConfigError = err.into();

        assert!(matches!(error, ConfigError::Settings(_)));
    }
}
