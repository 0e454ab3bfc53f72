//! Per-call retry bookkeeping.

use crate::config::ConfigurationTable;
use crate::failure::Failure;
use crate::key::ClassificationKey;
use crate::protocol::SoftThrottle;
use crate::resolve::{HandlerResolver, Resolution};
use crate::telemetry::Inspection;
use std::collections::HashMap;
use std::time::Duration;

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Sleep for the duration, then run the unit of work again.
    Retry(Duration),
    /// Hand the outcome of the last attempt to the caller.
    Stop,
}

#[derive(Debug)]
struct HandlerState {
    attempts: u32,
    wait: Option<Duration>,
}

impl HandlerState {
    fn new() -> Self {
        Self {
            attempts: 1,
            wait: None,
        }
    }
}

/// Attempt counters and cached waits for one call.
///
/// Lives exactly as long as the call, so nothing leaks into the registry or
/// into concurrent calls.
#[derive(Debug)]
pub(crate) struct RetryState {
    table: ConfigurationTable,
    handlers: HashMap<ClassificationKey, HandlerState>,
}

impl RetryState {
    pub(crate) fn new(table: ConfigurationTable) -> Self {
        Self {
            table,
            handlers: HashMap::new(),
        }
    }

    pub(crate) fn table(&self) -> &ConfigurationTable {
        &self.table
    }

    pub(crate) fn after_failure<E: Failure + ?Sized>(&mut self, failure: &E) -> Decision {
        let resolution = HandlerResolver::new(&self.table).resolve(failure);

        match resolution {
            Some(resolution) => self.advance(resolution),
            None => {
                tracing::debug!(
                    kind = %failure.kind(),
                    error = %failure,
                    "failure is not retriable"
                );
                Decision::Stop
            }
        }
    }

    pub(crate) fn after_success<T, P: SoftThrottle<T>>(
        &mut self,
        protocol: &P,
        value: &T,
    ) -> Decision {
        match protocol.inspect(value) {
            Inspection::Serviced => Decision::Stop,
            Inspection::Degraded(reason) => {
                tracing::warn!(
                    protocol = protocol.name(),
                    reason = %reason,
                    "could not read throttle telemetry, returning response as-is"
                );
                Decision::Stop
            }
            Inspection::Throttled(signal) => {
                let resolution = HandlerResolver::new(&self.table).resolve_throttle(&signal);
                match resolution {
                    Some(resolution) => self.advance(resolution),
                    None => Decision::Stop,
                }
            }
        }
    }

    /// Number of attempts made so far for `key`, counting the first one.
    #[cfg(test)]
    pub(crate) fn attempts(&self, key: &str) -> Option<u32> {
        self.handlers.get(key).map(|state| state.attempts)
    }

    fn advance(&mut self, resolution: Resolution) -> Decision {
        let tries = resolution.spec.tries;
        let state = self
            .handlers
            .entry(resolution.key.clone())
            .or_insert_with(HandlerState::new);

        if state.attempts >= tries {
            tracing::debug!(
                key = %resolution.key,
                attempts = state.attempts,
                tries,
                "retries exhausted"
            );
            return Decision::Stop;
        }

        let wait = match state.wait {
            Some(wait) => wait,
            None => {
                let strategy = resolution.wait_strategy(self.table.default_wait());
                let wait = strategy.wait();
                if strategy.is_cacheable() {
                    state.wait = Some(wait);
                }
                wait
            }
        };

        state.attempts += 1;
        tracing::debug!(
            key = %resolution.key,
            attempt = state.attempts,
            tries,
            wait_ms = wait.as_millis() as u64,
            "retrying"
        );

        Decision::Retry(wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CallOverride, ConfigRegistry, HandlerOptions};
    use crate::failure::FailureResponse;
    use crate::key::RETRY_AFTER_HEADER;
    use crate::protocol::{Graphql, Rest};
    use serde_json::{Value, json};

    #[derive(Debug, thiserror::Error)]
    #[error("Response code = {status}")]
    struct ClientError {
        status: u16,
        retry_after: Option<&'static str>,
    }

    impl FailureResponse for ClientError {
        fn status(&self) -> u16 {
            self.status
        }

        fn header(&self, name: &str) -> Option<&str> {
            (name == RETRY_AFTER_HEADER)
                .then_some(self.retry_after)
                .flatten()
        }
    }

    impl Failure for ClientError {
        fn response(&self) -> Option<&dyn FailureResponse> {
            Some(self)
        }
    }

    fn err(status: u16) -> ClientError {
        ClientError {
            status,
            retry_after: None,
        }
    }

    fn state(call: Option<&CallOverride>, primary: &str) -> RetryState {
        let table = ConfigRegistry::new().snapshot().merge(call, primary);
        RetryState::new(table.unwrap())
    }

    fn throttled(available: u32) -> Value {
        json!({
            "extensions": { "cost": {
                "requestedQueryCost": 250,
                "actualQueryCost": null,
                "throttleStatus": { "currentlyAvailable": available, "restoreRate": 50.0 }
            }}
        })
    }

    #[test]
    fn test_default_rate_limit_retries_once() {
        let mut state = state(None, "429");

        assert_eq!(
            state.after_failure(&err(429)),
            Decision::Retry(Duration::from_secs(2))
        );
        assert_eq!(state.attempts("429"), Some(2));
        assert_eq!(state.after_failure(&err(429)), Decision::Stop);
    }

    #[test]
    fn test_unmatched_failure_stops_without_state() {
        let mut state = state(None, "429");

        assert_eq!(state.after_failure(&err(500)), Decision::Stop);
        assert_eq!(state.attempts("500"), None);
    }

    #[test]
    fn test_keys_count_independently() {
        let call = CallOverride::table()
            .on("429", HandlerOptions::new().tries(2).wait(0.0))
            .on("5XX", HandlerOptions::new().tries(2).wait(0.0));
        let mut state = state(Some(&call), "429");

        assert_eq!(
            state.after_failure(&err(429)),
            Decision::Retry(Duration::ZERO)
        );
        assert_eq!(
            state.after_failure(&err(503)),
            Decision::Retry(Duration::ZERO)
        );
        assert_eq!(state.after_failure(&err(503)), Decision::Stop);
        assert_eq!(state.attempts("429"), Some(2));
    }

    #[test]
    fn test_first_wait_is_reused_for_the_key() {
        let mut state = state(Some(&CallOverride::table().tries(3)), "429");

        let first = ClientError {
            status: 429,
            retry_after: Some("1"),
        };
        let second = ClientError {
            status: 429,
            retry_after: Some("30"),
        };

        assert_eq!(
            state.after_failure(&first),
            Decision::Retry(Duration::from_secs(1))
        );
        assert_eq!(
            state.after_failure(&second),
            Decision::Retry(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_serviced_response_stops() {
        let mut state = state(None, "graphql");

        assert_eq!(
            state.after_success(&Graphql, &json!({ "data": { "foo": 1 } })),
            Decision::Stop
        );
        assert_eq!(state.attempts("graphql"), None);
    }

    #[test]
    fn test_throttle_wait_is_recomputed() {
        let mut state = state(Some(&CallOverride::table().tries(3)), "graphql");

        assert_eq!(
            state.after_success(&Graphql, &throttled(50)),
            Decision::Retry(Duration::from_secs(4))
        );
        assert_eq!(
            state.after_success(&Graphql, &throttled(150)),
            Decision::Retry(Duration::from_secs(2))
        );
        assert_eq!(
            state.after_success(&Graphql, &throttled(150)),
            Decision::Stop
        );
    }

    #[test]
    fn test_configured_graphql_wait_overrides_cost() {
        let mut state = state(Some(&CallOverride::table().wait(0.5)), "graphql");

        assert_eq!(
            state.after_success(&Graphql, &throttled(50)),
            Decision::Retry(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_rest_ignores_throttle_payloads() {
        let mut state = state(None, "429");
        assert_eq!(state.after_success(&Rest, &throttled(50)), Decision::Stop);
    }

    #[test]
    fn test_degraded_payload_stops() {
        let mut state = state(None, "graphql");
        assert_eq!(state.after_success(&Graphql, &"plain text"), Decision::Stop);
    }
}
