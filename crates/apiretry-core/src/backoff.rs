//! Wait derivation.
//!
//! Three strategies produce the delay before the next attempt:
//!
//! - **Fixed**: the configured wait (zero when none is configured)
//! - **RetryAfter**: the `Retry-After` header of a rate-limited response,
//!   then the registry default wait, then [`FALLBACK_RATE_LIMIT_WAIT`]
//! - **QueryCost**: `(requested - available) / restore_rate` seconds from
//!   cost telemetry
//!
//! There is no jitter and no exponential growth; each classification key
//! waits the same amount on every retry of a call.

use crate::key::FALLBACK_RATE_LIMIT_WAIT;
use crate::telemetry::ThrottleSignal;
use std::time::Duration;

/// How the wait for one retry is derived.
///
/// # Examples
///
/// ```rust
/// use apiretry_core::backoff::WaitStrategy;
/// use std::time::Duration;
///
/// let strategy = WaitStrategy::RetryAfter {
///     header: Some("3".to_string()),
///     default_wait: Some(1.0),
/// };
/// assert_eq!(strategy.wait(), Duration::from_secs(3));
///
/// let strategy = WaitStrategy::RetryAfter { header: None, default_wait: None };
/// assert_eq!(strategy.wait(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WaitStrategy {
    /// Configured wait in seconds; `None` waits zero.
    Fixed(Option<f64>),

    /// Rate-limit header value, falling back to the default wait.
    RetryAfter {
        /// Raw header value
        header: Option<String>,
        /// Registry default wait in seconds
        default_wait: Option<f64>,
    },

    /// Time for the throttle bucket to refill enough for the request.
    QueryCost(ThrottleSignal),
}

impl WaitStrategy {
    /// Compute the wait.
    pub fn wait(&self) -> Duration {
        match self {
            WaitStrategy::Fixed(wait) => wait.and_then(seconds).unwrap_or(Duration::ZERO),
            WaitStrategy::RetryAfter {
                header,
                default_wait,
            } => header
                .as_deref()
                .and_then(parse_retry_after)
                .or_else(|| default_wait.and_then(seconds))
                .unwrap_or(FALLBACK_RATE_LIMIT_WAIT),
            WaitStrategy::QueryCost(signal) => query_cost_wait(signal),
        }
    }

    /// Whether the wait may be reused for later retries of the same key
    /// within a call.
    ///
    /// Cost telemetry is fresh on every throttled response, so query-cost
    /// waits are recomputed each time.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, WaitStrategy::QueryCost(_))
    }
}

/// Parse a rate-limit header as a count of seconds.
///
/// Returns `None` for values that are not non-negative numbers.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .and_then(seconds)
}

/// Wait until enough cost points are restored to run the request.
///
/// Never negative; a signal that reports enough available points waits zero.
pub fn query_cost_wait(signal: &ThrottleSignal) -> Duration {
    if signal.restore_rate <= 0.0 {
        return Duration::ZERO;
    }

    let missing = (signal.requested - signal.available).max(0.0);
    seconds(missing / signal.restore_rate).unwrap_or(Duration::ZERO)
}

/// Convert seconds to a duration, saturating values too large to represent.
///
/// `None` for negative or NaN input.
fn seconds(value: f64) -> Option<Duration> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    Some(Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn signal(requested: f64, available: f64, restore_rate: f64) -> ThrottleSignal {
        ThrottleSignal {
            requested,
            available,
            restore_rate,
            maximum_available: None,
        }
    }

    #[test]
    fn test_fixed_wait() {
        assert_eq!(
            WaitStrategy::Fixed(Some(4.0)).wait(),
            Duration::from_secs(4)
        );
        assert_eq!(
            WaitStrategy::Fixed(Some(0.25)).wait(),
            Duration::from_millis(250)
        );
        assert_eq!(WaitStrategy::Fixed(None).wait(), Duration::ZERO);
    }

    #[test]
    fn test_oversized_waits_saturate() {
        assert_eq!(WaitStrategy::Fixed(Some(1e30)).wait(), Duration::MAX);
        assert_eq!(parse_retry_after("1e30"), Some(Duration::MAX));
        assert_eq!(query_cost_wait(&signal(1e300, 0.0, 1e-300)), Duration::MAX);
    }

    #[rstest]
    #[case(Some("3"), Some(1.0), Duration::from_secs(3))]
    #[case(Some(" 1.5 "), None, Duration::from_millis(1500))]
    #[case(None, Some(1.0), Duration::from_secs(1))]
    #[case(None, None, Duration::from_secs(2))]
    #[case(Some("soon"), Some(5.0), Duration::from_secs(5))]
    #[case(Some("-4"), None, Duration::from_secs(2))]
    #[case(Some("inf"), None, Duration::from_secs(2))]
    fn test_retry_after_fallbacks(
        #[case] header: Option<&str>,
        #[case] default_wait: Option<f64>,
        #[case] expected: Duration,
    ) {
        let strategy = WaitStrategy::RetryAfter {
            header: header.map(String::from),
            default_wait,
        };
        assert_eq!(strategy.wait(), expected);
    }

    #[test]
    fn test_query_cost_wait() {
        assert_eq!(
            query_cost_wait(&signal(250.0, 50.0, 50.0)),
            Duration::from_secs(4)
        );
        assert_eq!(
            query_cost_wait(&signal(100.0, 75.0, 50.0)),
            Duration::from_millis(500)
        );
        assert_eq!(query_cost_wait(&signal(10.0, 50.0, 50.0)), Duration::ZERO);
        assert_eq!(query_cost_wait(&signal(10.0, 0.0, 0.0)), Duration::ZERO);
    }

    #[test]
    fn test_only_query_cost_is_recomputed() {
        assert!(WaitStrategy::Fixed(None).is_cacheable());
        assert!(
            WaitStrategy::RetryAfter {
                header: None,
                default_wait: None,
            }
            .is_cacheable()
        );
        assert!(!WaitStrategy::QueryCost(signal(1.0, 0.0, 1.0)).is_cacheable());
    }

    proptest! {
        /// Property: the cost wait is never negative and matches the formula
        #[test]
        fn prop_query_cost_wait_formula(
            requested in 0.0f64..10_000.0,
            available in 0.0f64..10_000.0,
            restore_rate in 0.1f64..1_000.0,
        ) {
            let wait = query_cost_wait(&signal(requested, available, restore_rate));
            let expected = ((requested - available).max(0.0)) / restore_rate;

            prop_assert!((wait.as_secs_f64() - expected).abs() < 1e-6);
        }
    }
}
