//! Handler options and per-call overrides.

use super::table::HandlerSpec;
use crate::error::ConfigError;
use crate::key::ClassificationKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Partially specified retry options for a classification key.
///
/// Unset fields are filled from the registry defaults current when the
/// options are applied.
///
/// # Examples
///
/// ```rust
/// use apiretry_core::config::HandlerOptions;
///
/// let options = HandlerOptions::new().tries(3).wait(0.5);
/// assert_eq!(options.tries, Some(3));
/// assert_eq!(options.wait, Some(0.5));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerOptions {
    /// Maximum attempts, including the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tries: Option<u32>,

    /// Seconds to wait between attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<f64>,
}

impl HandlerOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts.
    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Set the wait in seconds.
    pub fn wait(mut self, seconds: f64) -> Self {
        self.wait = Some(seconds);
        self
    }

    /// Whether neither field is set.
    pub fn is_empty(&self) -> bool {
        self.tries.is_none() && self.wait.is_none()
    }

    pub(crate) fn resolve(&self, default_wait: Option<f64>, default_tries: u32) -> HandlerSpec {
        HandlerSpec {
            tries: self.tries.unwrap_or(default_tries),
            wait: self.wait.or(default_wait),
        }
    }
}

/// Table-shaped per-call override.
///
/// Keyed entries replace the snapshot entry for that key. The bare `tries`
/// and `wait` fields patch the protocol's primary entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    entries: BTreeMap<ClassificationKey, HandlerOptions>,
    primary: HandlerOptions,
}

impl OverrideTable {
    /// Register options for a key.
    pub fn on(mut self, key: impl Into<ClassificationKey>, options: HandlerOptions) -> Self {
        self.entries.insert(key.into(), options);
        self
    }

    /// Set tries on the primary entry.
    pub fn tries(mut self, tries: u32) -> Self {
        self.primary.tries = Some(tries);
        self
    }

    /// Set the wait on the primary entry.
    pub fn wait(mut self, seconds: f64) -> Self {
        self.primary.wait = Some(seconds);
        self
    }

    /// Keyed entries.
    pub fn entries(&self) -> impl Iterator<Item = (&ClassificationKey, &HandlerOptions)> {
        self.entries.iter()
    }

    /// Bare options applied to the primary entry.
    pub fn primary(&self) -> &HandlerOptions {
        &self.primary
    }
}

/// Override supplied with a single call.
///
/// Deserializes from a number (the deprecated bare wait) or from a map whose
/// values are `{ tries, wait }` records, plus optional bare `tries`/`wait`
/// numbers for the primary entry:
///
/// ```rust
/// use apiretry_core::config::{CallOverride, HandlerOptions};
///
/// let call: CallOverride = serde_json::from_str(
///     r#"{ "tries": 4, "wait": 0, "5XX": { "tries": 2, "wait": 1 } }"#,
/// ).unwrap();
///
/// assert_eq!(
///     call,
///     CallOverride::table()
///         .tries(4)
///         .wait(0.0)
///         .on("5XX", HandlerOptions::new().tries(2).wait(1.0))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum CallOverride {
    /// Wait in seconds for the primary entry.
    ///
    /// Kept for backwards compatibility; merging it logs a deprecation
    /// warning.
    Wait(f64),

    /// Per-key options.
    Table(OverrideTable),
}

impl CallOverride {
    /// Start an empty table override.
    pub fn table() -> Self {
        CallOverride::Table(OverrideTable::default())
    }

    /// Register options for a key.
    ///
    /// A bare wait override becomes a table with that wait on the primary
    /// entry.
    pub fn on(self, key: impl Into<ClassificationKey>, options: HandlerOptions) -> Self {
        CallOverride::Table(self.into_table().on(key, options))
    }

    /// Set tries on the primary entry.
    pub fn tries(self, tries: u32) -> Self {
        CallOverride::Table(self.into_table().tries(tries))
    }

    /// Set the wait on the primary entry.
    pub fn wait(self, seconds: f64) -> Self {
        CallOverride::Table(self.into_table().wait(seconds))
    }

    fn into_table(self) -> OverrideTable {
        match self {
            CallOverride::Table(table) => table,
            CallOverride::Wait(wait) => OverrideTable::default().wait(wait),
        }
    }
}

impl From<OverrideTable> for CallOverride {
    fn from(table: OverrideTable) -> Self {
        CallOverride::Table(table)
    }
}

impl PartialEq<OverrideTable> for CallOverride {
    fn eq(&self, other: &OverrideTable) -> bool {
        matches!(self, CallOverride::Table(table) if table == other)
    }
}

impl TryFrom<Value> for CallOverride {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(number) => number
                .as_f64()
                .map(CallOverride::Wait)
                .ok_or_else(|| ConfigError::InvalidOverride(format!("unsupported wait {number}"))),
            Value::Object(map) => {
                let mut table = OverrideTable::default();
                for (key, value) in map {
                    match (key.as_str(), value) {
                        (_, value @ Value::Object(_)) => {
                            let options: HandlerOptions = serde_json::from_value(value)
                                .map_err(|e| ConfigError::InvalidOverride(format!("{key}: {e}")))?;
                            table.entries.insert(ClassificationKey::new(key.clone()), options);
                        }
                        ("tries", Value::Number(number)) => {
                            let tries = number
                                .as_u64()
                                .and_then(|n| u32::try_from(n).ok())
                                .ok_or_else(|| {
                                    ConfigError::InvalidOverride(format!("invalid tries {number}"))
                                })?;
                            table.primary.tries = Some(tries);
                        }
                        ("wait", Value::Number(number)) => {
                            table.primary.wait = number.as_f64();
                        }
                        (key, other) => {
                            return Err(ConfigError::InvalidOverride(format!(
                                "unexpected value for {key:?}: {other}"
                            )));
                        }
                    }
                }
                Ok(CallOverride::Table(table))
            }
            other => Err(ConfigError::InvalidOverride(format!(
                "config must be a table, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_resolve_with_defaults() {
        let spec = HandlerOptions::new().tries(3).resolve(Some(5.0), 2);
        assert_eq!(spec, HandlerSpec::new(3, Some(5.0)));

        let spec = HandlerOptions::new().resolve(None, 2);
        assert_eq!(spec, HandlerSpec::new(2, None));
    }

    #[test]
    fn test_bare_number_is_deprecated_wait() {
        let call = CallOverride::try_from(json!(3)).unwrap();
        assert_eq!(call, CallOverride::Wait(3.0));
    }

    #[test]
    fn test_table_from_value() {
        let call = CallOverride::try_from(json!({
            "429": { "tries": 2, "wait": 0 },
            "SocketError": { "tries": 5 },
            "wait": 1.5,
        }))
        .unwrap();

        let expected = CallOverride::table()
            .on(429u16, HandlerOptions::new().tries(2).wait(0.0))
            .on("SocketError", HandlerOptions::new().tries(5))
            .wait(1.5);
        assert_eq!(call, expected);
    }

    #[test]
    fn test_builder_upgrades_bare_wait() {
        let call = CallOverride::Wait(2.0).on("5XX", HandlerOptions::new().tries(3));

        assert_eq!(
            call,
            OverrideTable::default()
                .wait(2.0)
                .on("5XX", HandlerOptions::new().tries(3))
        );
    }

    #[test]
    fn test_wrong_shapes_are_rejected() {
        assert!(matches!(
            CallOverride::try_from(json!("soon")),
            Err(ConfigError::InvalidOverride(_))
        ));
        assert!(matches!(
            CallOverride::try_from(json!({ "5XX": 3 })),
            Err(ConfigError::InvalidOverride(_))
        ));
        assert!(matches!(
            CallOverride::try_from(json!({ "tries": -1 })),
            Err(ConfigError::InvalidOverride(_))
        ));
        assert!(matches!(
            CallOverride::try_from(json!({ "5XX": { "retries": 3 } })),
            Err(ConfigError::InvalidOverride(_))
        ));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let call: CallOverride = toml::from_str(
            r#"
            tries = 4
            [5XX]
            tries = 2
            wait = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(
            call,
            CallOverride::table()
                .tries(4)
                .on("5XX", HandlerOptions::new().tries(2).wait(0.0))
        );
    }
}
