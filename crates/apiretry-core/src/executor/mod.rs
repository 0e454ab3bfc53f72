//! The retry loop.
//!
//! A [`RequestExecutor`] runs one unit of work until it succeeds, fails in a
//! way nobody configured a handler for, or runs out of attempts for the
//! matching classification key. Attempt counters and cached waits live in
//! the executor, so every call starts from a clean slate.

mod sleep;
mod state;

pub use sleep::{Sleeper, ThreadSleeper, sleep_fully};

use crate::config::{CallOverride, ConfigRegistry, ConfigurationTable};
use crate::error::Result;
use crate::failure::Failure;
use crate::protocol::{Protocol, SoftThrottle};
use state::{Decision, RetryState};
use std::future::Future;

/// Runs a unit of work under a [`ConfigurationTable`].
///
/// # Examples
///
/// ```rust
/// use apiretry_core::config::{CallOverride, ConfigRegistry, HandlerOptions};
/// use apiretry_core::executor::RequestExecutor;
/// use apiretry_core::protocol::Rest;
///
/// let registry = ConfigRegistry::new();
/// let call = CallOverride::table().on(
///     std::any::type_name::<std::io::Error>(),
///     HandlerOptions::new().tries(3).wait(0.0),
/// );
///
/// let mut calls = 0;
/// let result = RequestExecutor::from_registry(&registry, Rest, Some(&call))
///     .unwrap()
///     .run(|| {
///         calls += 1;
///         if calls < 3 {
///             Err(std::io::Error::other("connection reset"))
///         } else {
///             Ok("done")
///         }
///     });
///
/// assert_eq!(result.unwrap(), "done");
/// assert_eq!(calls, 3);
/// ```
#[derive(Debug)]
pub struct RequestExecutor<P, S = ThreadSleeper> {
    protocol: P,
    state: RetryState,
    sleeper: S,
}

impl<P: Protocol> RequestExecutor<P> {
    /// Create an executor over an already merged table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if the table has
    /// an invalid entry.
    pub fn new(protocol: P, table: ConfigurationTable) -> Result<Self> {
        table.validate()?;
        Ok(Self {
            protocol,
            state: RetryState::new(table),
            sleeper: ThreadSleeper,
        })
    }

    /// Snapshot the registry, apply the per-call override and create an
    /// executor.
    ///
    /// Bare `tries`/`wait` override values apply to the protocol's primary
    /// key.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if the merged
    /// table has an invalid entry.
    pub fn from_registry(
        registry: &ConfigRegistry,
        protocol: P,
        call: Option<&CallOverride>,
    ) -> Result<Self> {
        let table = registry.snapshot().merge(call, protocol.primary_key())?;
        Ok(Self {
            protocol,
            state: RetryState::new(table),
            sleeper: ThreadSleeper,
        })
    }
}

impl<P: Protocol, S> RequestExecutor<P, S> {
    /// Replace the sleeper used by [`run`](Self::run).
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RequestExecutor<P, S2> {
        RequestExecutor {
            protocol: self.protocol,
            state: self.state,
            sleeper,
        }
    }

    /// The table governing this call.
    pub fn table(&self) -> &ConfigurationTable {
        self.state.table()
    }

    /// The protocol of this call.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Run the unit of work asynchronously, sleeping on the tokio timer.
    ///
    /// Behaves like [`run`](Self::run); the configured sleeper is not used.
    pub async fn run_async<T, E, F, Fut>(mut self, mut work: F) -> std::result::Result<T, E>
    where
        P: SoftThrottle<T>,
        E: Failure,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        loop {
            let (decision, outcome) = self.judge(work().await);
            match decision {
                Decision::Stop => return outcome,
                Decision::Retry(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    fn judge<T, E>(
        &mut self,
        outcome: std::result::Result<T, E>,
    ) -> (Decision, std::result::Result<T, E>)
    where
        P: SoftThrottle<T>,
        E: Failure,
    {
        let decision = match &outcome {
            Ok(value) => self.state.after_success(&self.protocol, value),
            Err(failure) => self.state.after_failure(failure),
        };
        (decision, outcome)
    }
}

impl<P: Protocol, S: Sleeper> RequestExecutor<P, S> {
    /// Run the unit of work, blocking between attempts.
    ///
    /// Returns the first successful value that is not throttled, the last
    /// (throttled) value once the throttle entry is exhausted, or the last
    /// failure. A failure with no matching entry is returned after a single
    /// attempt without sleeping.
    pub fn run<T, E, F>(mut self, mut work: F) -> std::result::Result<T, E>
    where
        P: SoftThrottle<T>,
        E: Failure,
        F: FnMut() -> std::result::Result<T, E>,
    {
        loop {
            let (decision, outcome) = self.judge(work());
            match decision {
                Decision::Stop => return outcome,
                Decision::Retry(wait) => {
                    sleep_fully(&self.sleeper, wait);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandlerOptions;
    use crate::error::ConfigError;
    use crate::executor::sleep::MockSleeper;
    use crate::protocol::{Graphql, Rest};
    use mockall::predicate::eq;
    use serde_json::json;
    use std::time::Duration;

    fn io_error() -> std::io::Error {
        std::io::Error::other("Failed to open TCP connection")
    }

    #[test]
    fn test_success_runs_once_without_sleeping() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();

        let mut calls = 0;
        let result: std::result::Result<_, std::io::Error> =
            RequestExecutor::from_registry(&ConfigRegistry::new(), Rest, None)
                .unwrap()
                .with_sleeper(&sleeper)
                .run(|| {
                    calls += 1;
                    Ok(calls)
                });

        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_retries_kind_until_exhausted() {
        let mut registry = ConfigRegistry::new();
        registry.on(
            std::any::type_name::<std::io::Error>(),
            HandlerOptions::new().tries(3).wait(1.5),
        );

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .with(eq(Duration::from_millis(1500)))
            .times(2)
            .returning(|d| d);

        let mut calls = 0;
        let result: std::result::Result<(), _> =
            RequestExecutor::from_registry(&registry, Rest, None)
                .unwrap()
                .with_sleeper(&sleeper)
                .run(|| {
                    calls += 1;
                    Err(io_error())
                });

        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhausted_throttle_returns_last_payload() {
        let throttled = json!({
            "extensions": { "cost": {
                "requestedQueryCost": 250,
                "throttleStatus": { "currentlyAvailable": 50, "restoreRate": 50.0 }
            }}
        });

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .with(eq(Duration::from_secs(4)))
            .times(1)
            .returning(|d| d);

        let mut calls = 0;
        let result: std::result::Result<_, std::io::Error> =
            RequestExecutor::from_registry(&ConfigRegistry::new(), Graphql, None)
                .unwrap()
                .with_sleeper(&sleeper)
                .run(|| {
                    calls += 1;
                    Ok(throttled.clone())
                });

        assert_eq!(result.unwrap(), throttled);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_invalid_override_is_rejected_before_running() {
        let call = CallOverride::Wait(-1.0);
        let err = RequestExecutor::from_registry(&ConfigRegistry::new(), Rest, Some(&call))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidWait { .. }));
    }

    #[test]
    fn test_new_validates_table() {
        let mut table = ConfigRegistry::new().snapshot();
        table.insert("5XX", crate::config::HandlerSpec::new(0, None));

        assert!(RequestExecutor::new(Rest, table).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_async_waits_on_tokio_timer() {
        let mut registry = ConfigRegistry::new();
        registry.on(
            std::any::type_name::<std::io::Error>(),
            HandlerOptions::new().tries(2).wait(3.0),
        );

        let start = tokio::time::Instant::now();
        let mut calls = 0;
        let result = RequestExecutor::from_registry(&registry, Rest, None)
            .unwrap()
            .run_async(|| {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt == 1 {
                        Err(io_error())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
