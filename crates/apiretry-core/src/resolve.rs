//! Matching failures and throttle signals against a configuration table.

use crate::backoff::WaitStrategy;
use crate::config::{ConfigurationTable, HandlerSpec};
use crate::failure::Failure;
use crate::key::{ClassificationKey, GRAPHQL_KEY, RATE_LIMIT_STATUS, RETRY_AFTER_HEADER};
use crate::telemetry::ThrottleSignal;

/// What triggered a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A failure raised by the unit of work.
    Failure {
        /// Status code of the failure's response, if any
        status: Option<u16>,
        /// `Retry-After` header of a rate-limited response
        retry_after: Option<String>,
    },

    /// A serviced-but-throttled cost-metered response.
    Throttle(ThrottleSignal),
}

/// The handler chosen for a failure or throttle signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Key the spec was found under
    pub key: ClassificationKey,
    /// Static retry settings for that key
    pub spec: HandlerSpec,
    /// What was resolved
    pub trigger: Trigger,
}

impl Resolution {
    /// Pick the wait derivation for this resolution.
    ///
    /// A configured wait always wins. Otherwise a rate-limited failure reads
    /// its `Retry-After` header, a throttle signal uses its cost numbers and
    /// anything else waits zero.
    pub fn wait_strategy(&self, default_wait: Option<f64>) -> WaitStrategy {
        if self.spec.wait.is_some() {
            return WaitStrategy::Fixed(self.spec.wait);
        }

        match &self.trigger {
            Trigger::Failure {
                status: Some(RATE_LIMIT_STATUS),
                retry_after,
            } => WaitStrategy::RetryAfter {
                header: retry_after.clone(),
                default_wait,
            },
            Trigger::Failure { .. } => WaitStrategy::Fixed(None),
            Trigger::Throttle(signal) => WaitStrategy::QueryCost(*signal),
        }
    }

    /// Whether this resolution is for a rate-limited (429) failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self.trigger,
            Trigger::Failure {
                status: Some(RATE_LIMIT_STATUS),
                ..
            }
        )
    }
}

/// Finds the [`HandlerSpec`] governing a failure.
///
/// Resolution order:
/// 1. exact match on the failure kind
/// 2. exact match on the response status (`"503"`)
/// 3. match on the status class (`"5XX"`)
///
/// Anything else is not retriable.
///
/// # Examples
///
/// ```rust
/// use apiretry_core::config::{ConfigRegistry, HandlerOptions};
/// use apiretry_core::resolve::HandlerResolver;
///
/// let mut registry = ConfigRegistry::new();
/// registry.on(std::any::type_name::<std::io::Error>(), HandlerOptions::new().tries(3));
/// let table = registry.snapshot();
///
/// let resolver = HandlerResolver::new(&table);
/// let resolution = resolver.resolve(&std::io::Error::other("reset")).unwrap();
/// assert_eq!(resolution.spec.tries, 3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HandlerResolver<'t> {
    table: &'t ConfigurationTable,
}

impl<'t> HandlerResolver<'t> {
    /// Create a resolver over a table.
    pub fn new(table: &'t ConfigurationTable) -> Self {
        Self { table }
    }

    /// Find the handler for a failure, or `None` if it is not retriable.
    pub fn resolve<F: Failure + ?Sized>(&self, failure: &F) -> Option<Resolution> {
        let response = failure.response();
        let trigger = Trigger::Failure {
            status: response.map(|r| r.status()),
            retry_after: response
                .filter(|r| r.status() == RATE_LIMIT_STATUS)
                .and_then(|r| r.header(RETRY_AFTER_HEADER))
                .map(String::from),
        };

        let kind = failure.kind();
        if let Some(spec) = self.table.get(&kind) {
            return Some(Resolution {
                key: ClassificationKey::new(kind.into_owned()),
                spec: *spec,
                trigger,
            });
        }

        let status = response?.status();
        [
            ClassificationKey::status(status),
            ClassificationKey::status_class(status),
        ]
        .into_iter()
        .find_map(|key| {
            self.table.get(key.as_str()).map(|spec| Resolution {
                spec: *spec,
                key,
                trigger: trigger.clone(),
            })
        })
    }

    /// Find the handler for a cost-metered throttle signal.
    pub fn resolve_throttle(&self, signal: &ThrottleSignal) -> Option<Resolution> {
        self.table.get(GRAPHQL_KEY).map(|spec| Resolution {
            key: ClassificationKey::graphql(),
            spec: *spec,
            trigger: Trigger::Throttle(*signal),
        })
    }
}
