//! Classification keys used to look up handler configuration.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

/// HTTP status that signals rate limiting.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Key of the rate-limit status entry.
pub const RATE_LIMIT_KEY: &str = "429";

/// Response header carrying the number of seconds to wait after a 429.
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Fixed key used for cost-metered (GraphQL) throttling.
pub const GRAPHQL_KEY: &str = "graphql";

/// Default maximum number of attempts.
pub const DEFAULT_TRIES: u32 = 2;

/// Wait used for a rate-limited failure when neither the response nor the
/// registry provides one.
pub const FALLBACK_RATE_LIMIT_WAIT: Duration = Duration::from_secs(2);

/// The string a [`HandlerSpec`](crate::config::HandlerSpec) is registered under.
///
/// A key is one of:
/// - an exact status code (`"429"`)
/// - a status class (`"5XX"`)
/// - an error kind, i.e. the fully-qualified type name of a failure
/// - the fixed `"graphql"` key for cost-metered calls
///
/// # Examples
///
/// ```rust
/// use apiretry_core::key::ClassificationKey;
///
/// assert_eq!(ClassificationKey::status(503).as_str(), "503");
/// assert_eq!(ClassificationKey::status_class(503).as_str(), "5XX");
/// assert_eq!(ClassificationKey::from(429u16).as_str(), "429");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationKey(String);

impl ClassificationKey {
    /// Create a key from any string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Exact status code key.
    pub fn status(code: u16) -> Self {
        Self(code.to_string())
    }

    /// Status class key: the leading digit followed by `XX`.
    pub fn status_class(code: u16) -> Self {
        let digit = code.to_string().chars().next().unwrap_or('0');
        Self(format!("{digit}XX"))
    }

    /// Error kind key for a failure type.
    ///
    /// Matches the default [`Failure::kind`](crate::failure::Failure::kind).
    pub fn of<E: ?Sized>() -> Self {
        Self(std::any::type_name::<E>().to_string())
    }

    /// Key for cost-metered throttling.
    pub fn graphql() -> Self {
        Self(GRAPHQL_KEY.to_string())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassificationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassificationKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ClassificationKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&String> for ClassificationKey {
    fn from(key: &String) -> Self {
        Self(key.clone())
    }
}

impl From<u16> for ClassificationKey {
    fn from(code: u16) -> Self {
        Self::status(code)
    }
}

/// One key or a collection of keys.
///
/// Lets [`ConfigRegistry::on`](crate::config::ConfigRegistry::on) register a
/// single key or several keys with the same options.
pub trait IntoKeys {
    /// Expand into the individual keys.
    fn into_keys(self) -> Vec<ClassificationKey>;
}

impl IntoKeys for ClassificationKey {
    fn into_keys(self) -> Vec<ClassificationKey> {
        vec![self]
    }
}

impl IntoKeys for &str {
    fn into_keys(self) -> Vec<ClassificationKey> {
        vec![self.into()]
    }
}

impl IntoKeys for String {
    fn into_keys(self) -> Vec<ClassificationKey> {
        vec![self.into()]
    }
}

impl IntoKeys for u16 {
    fn into_keys(self) -> Vec<ClassificationKey> {
        vec![self.into()]
    }
}

impl<K: Into<ClassificationKey>, const N: usize> IntoKeys for [K; N] {
    fn into_keys(self) -> Vec<ClassificationKey> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<K: Into<ClassificationKey>> IntoKeys for Vec<K> {
    fn into_keys(self) -> Vec<ClassificationKey> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<K: Into<ClassificationKey> + Clone> IntoKeys for &[K] {
    fn into_keys(self) -> Vec<ClassificationKey> {
        self.iter().cloned().map(Into::into).collect()
    }
}
