//! Per-call configuration tables.

use super::call_override::{CallOverride, HandlerOptions};
use crate::error::{ConfigError, Result};
use crate::key::ClassificationKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::Duration;

/// Retry behavior for one classification key.
///
/// Attempt counters are not stored here; they belong to the executor
/// running a single call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandlerSpec {
    /// Maximum number of attempts, including the first one.
    pub tries: u32,

    /// Seconds to wait before retrying. `None` means the wait is derived when
    /// the failure is handled.
    pub wait: Option<f64>,
}

impl HandlerSpec {
    /// Create a spec.
    pub fn new(tries: u32, wait: Option<f64>) -> Self {
        Self { tries, wait }
    }

    fn validate(&self, key: &ClassificationKey) -> Result<()> {
        if self.tries == 0 {
            return Err(ConfigError::InvalidTries {
                key: key.to_string(),
            });
        }

        if let Some(wait) = self.wait
            && Duration::try_from_secs_f64(wait).is_err()
        {
            return Err(ConfigError::InvalidWait {
                key: key.to_string(),
                wait,
            });
        }

        Ok(())
    }
}

/// Mapping from classification key to [`HandlerSpec`] used by one call.
///
/// Produced by [`ConfigRegistry::snapshot`](super::ConfigRegistry::snapshot)
/// and finalized with [`merge`](Self::merge). The table also remembers the
/// registry default wait at snapshot time, used when deriving the wait of a
/// rate-limited failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationTable {
    entries: BTreeMap<ClassificationKey, HandlerSpec>,
    default_wait: Option<f64>,
    default_tries: u32,
}

impl ConfigurationTable {
    pub(crate) fn with_defaults(default_wait: Option<f64>, default_tries: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            default_wait,
            default_tries,
        }
    }

    /// Look up the spec registered for `key`.
    pub fn get(&self, key: &str) -> Option<&HandlerSpec> {
        self.entries.get(key)
    }

    /// Check whether `key` has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace the spec for `key`.
    pub fn insert(&mut self, key: impl Into<ClassificationKey>, spec: HandlerSpec) {
        self.entries.insert(key.into(), spec);
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, ClassificationKey, HandlerSpec> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry default wait captured at snapshot time.
    pub fn default_wait(&self) -> Option<f64> {
        self.default_wait
    }

    /// Registry default tries captured at snapshot time.
    pub fn default_tries(&self) -> u32 {
        self.default_tries
    }

    /// Apply a per-call override and validate the result.
    ///
    /// `primary` names the entry that bare `tries`/`wait` values (and the
    /// deprecated bare wait) apply to: `"429"` for REST calls, `"graphql"`
    /// for cost-metered calls.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWait`] if any entry ends up with a
    /// wait that is negative, non-finite or too large for a [`Duration`], and
    /// [`ConfigError::InvalidTries`] if any entry has zero tries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use apiretry_core::config::{CallOverride, ConfigRegistry, HandlerOptions};
    ///
    /// let registry = ConfigRegistry::new();
    /// let call = CallOverride::table().on("5XX", HandlerOptions::new().tries(2).wait(0.0));
    ///
    /// let table = registry.snapshot().merge(Some(&call), "429").unwrap();
    /// assert_eq!(table.get("5XX").unwrap().tries, 2);
    /// ```
    pub fn merge(mut self, call: Option<&CallOverride>, primary: &str) -> Result<Self> {
        match call {
            None => {}
            Some(CallOverride::Wait(wait)) => {
                tracing::warn!(
                    wait = *wait,
                    "passing a bare wait to retry is deprecated and will be removed, use a table with `wait` instead"
                );
                self.patch_primary(primary, &HandlerOptions::new().wait(*wait));
            }
            Some(CallOverride::Table(overrides)) => {
                for (key, options) in overrides.entries() {
                    let spec = options.resolve(self.default_wait, self.default_tries);
                    self.entries.insert(key.clone(), spec);
                }
                self.patch_primary(primary, overrides.primary());
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Check every entry for invalid tries and waits.
    pub fn validate(&self) -> Result<()> {
        self.entries
            .iter()
            .try_for_each(|(key, spec)| spec.validate(key))
    }

    fn patch_primary(&mut self, primary: &str, options: &HandlerOptions) {
        if options.is_empty() {
            return;
        }

        let (default_wait, default_tries) = (self.default_wait, self.default_tries);
        let spec = self
            .entries
            .entry(ClassificationKey::from(primary))
            .or_insert_with(|| HandlerSpec::new(default_tries, default_wait));

        if let Some(tries) = options.tries {
            spec.tries = tries;
        }
        if options.wait.is_some() {
            spec.wait = options.wait;
        }
    }
}

impl<'a> IntoIterator for &'a ConfigurationTable {
    type Item = (&'a ClassificationKey, &'a HandlerSpec);
    type IntoIter = btree_map::Iter<'a, ClassificationKey, HandlerSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
