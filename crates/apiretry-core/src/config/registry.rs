//! Process-wide retry configuration.

use super::call_override::HandlerOptions;
use super::table::{ConfigurationTable, HandlerSpec};
use crate::key::{ClassificationKey, DEFAULT_TRIES, GRAPHQL_KEY, IntoKeys, RATE_LIMIT_STATUS};
use std::collections::BTreeMap;

/// Default waits, default tries and per-key overrides.
///
/// The registry is plain data: it is configured once (typically at startup)
/// and handed to executors by reference. It does no locking of its own; wrap
/// it in a lock if it has to be reconfigured while calls are running.
///
/// # Examples
///
/// ```rust
/// use apiretry_core::config::{ConfigRegistry, HandlerOptions};
///
/// let mut registry = ConfigRegistry::new();
/// registry.set_default_wait(Some(1.0));
/// registry.on("5XX", HandlerOptions::new().tries(4).wait(3.0));
///
/// let table = registry.snapshot();
/// assert_eq!(table.get("429").unwrap().wait, Some(1.0));
/// assert_eq!(table.get("5XX").unwrap().tries, 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRegistry {
    default_wait: Option<f64>,
    default_tries: u32,
    settings: BTreeMap<ClassificationKey, HandlerSpec>,
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self {
            default_wait: None,
            default_tries: DEFAULT_TRIES,
            settings: BTreeMap::new(),
        }
    }
}

impl ConfigRegistry {
    /// Create a registry with default settings (no wait, 2 tries).
    pub fn new() -> Self {
        Self::default()
    }

    /// Default wait in seconds for keys without an explicit one.
    pub fn default_wait(&self) -> Option<f64> {
        self.default_wait
    }

    /// Default maximum attempts for keys without an explicit one.
    pub fn default_tries(&self) -> u32 {
        self.default_tries
    }

    /// Set the default wait. `None` derives the wait from the response.
    pub fn set_default_wait(&mut self, seconds: Option<f64>) -> &mut Self {
        self.default_wait = seconds;
        self
    }

    /// Set the default maximum number of attempts.
    pub fn set_default_tries(&mut self, tries: u32) -> &mut Self {
        self.default_tries = tries;
        self
    }

    /// Register options for one key or a collection of keys.
    ///
    /// Fields missing from `options` take the defaults current at this call;
    /// changing the defaults later does not affect already registered keys.
    ///
    /// ```rust
    /// use apiretry_core::config::{ConfigRegistry, HandlerOptions};
    /// use apiretry_core::key::ClassificationKey;
    ///
    /// let mut registry = ConfigRegistry::new();
    /// registry
    ///     .on(520u16, HandlerOptions::new().wait(2.0).tries(3))
    ///     .on(
    ///         [ClassificationKey::of::<std::io::Error>(), "SystemCallError".into()],
    ///         HandlerOptions::new().wait(1.0).tries(1),
    ///     );
    ///
    /// assert_eq!(registry.snapshot().len(), 5);
    /// ```
    pub fn on(&mut self, keys: impl IntoKeys, options: HandlerOptions) -> &mut Self {
        let spec = options.resolve(self.default_wait, self.default_tries);
        for key in keys.into_keys() {
            self.settings.insert(key, spec);
        }
        self
    }

    /// Forget all overrides and reset the defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Materialize the registry into a fresh table.
    ///
    /// The table always contains the `"429"` and `"graphql"` entries built
    /// from the current defaults; registered overrides replace them.
    pub fn snapshot(&self) -> ConfigurationTable {
        let mut table = ConfigurationTable::with_defaults(self.default_wait, self.default_tries);
        let seed = HandlerSpec::new(self.default_tries, self.default_wait);

        table.insert(RATE_LIMIT_STATUS, seed);
        table.insert(GRAPHQL_KEY, seed);
        for (key, spec) in &self.settings {
            table.insert(key.clone(), *spec);
        }

        table
    }
}
