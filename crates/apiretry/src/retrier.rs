//! The client-facing retry entry point.

use crate::error::{Error, Result};
use crate::http_failure::HttpFailure;
use crate::observability::{CallMetadata, CallTimer};
use apiretry_core::config::{CallOverride, ConfigRegistry, RegistrySettings};
use apiretry_core::error::ConfigError;
use apiretry_core::executor::RequestExecutor;
use apiretry_core::failure::Failure;
use apiretry_core::protocol::{Graphql, Protocol, Rest, SoftThrottle};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;

/// Owns the retry configuration and starts calls.
///
/// # Examples
///
/// ```rust
/// use apiretry::{ConfigRegistry, HandlerOptions, Retrier};
///
/// let mut retrier = Retrier::new();
/// retrier.configure(|config: &mut ConfigRegistry| {
///     config.set_default_wait(Some(0.0));
///     config.on(["5XX", "Net::ReadTimeout"], HandlerOptions::new().tries(3));
/// });
///
/// let value = retrier
///     .rest()
///     .run(|| Ok::<_, apiretry::Error>("foo"))
///     .unwrap();
/// assert_eq!(value, "foo");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    registry: ConfigRegistry,
}

impl Retrier {
    /// Create a retrier with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a retrier around an existing registry.
    pub fn with_registry(registry: ConfigRegistry) -> Self {
        Self { registry }
    }

    /// Create a retrier from loaded settings.
    pub fn from_settings(settings: &RegistrySettings) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            registry: ConfigRegistry::from_settings(settings)?,
        })
    }

    /// Create a retrier configured from environment variables.
    ///
    /// See [`RegistrySettings::from_env`].
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_settings(&RegistrySettings::from_env())
    }

    /// Change the configuration.
    ///
    /// Calls already started keep the table they were started with.
    pub fn configure(&mut self, f: impl FnOnce(&mut ConfigRegistry)) -> &mut Self {
        f(&mut self.registry);
        self
    }

    /// The current configuration.
    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// Reset the configuration to its defaults.
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Start a REST call.
    pub fn rest(&self) -> Call<'_, Rest> {
        self.call(Rest)
    }

    /// Start a cost-metered GraphQL call.
    pub fn graphql(&self) -> Call<'_, Graphql> {
        self.call(Graphql)
    }

    /// Start a call with any protocol.
    pub fn call<P: Protocol>(&self, protocol: P) -> Call<'_, P> {
        Call {
            registry: &self.registry,
            protocol,
            call: None,
        }
    }
}

/// A call that has not run yet.
#[derive(Debug)]
#[must_use = "a call does nothing until it is run"]
pub struct Call<'r, P> {
    registry: &'r ConfigRegistry,
    protocol: P,
    call: Option<CallOverride>,
}

impl<P: Protocol> Call<'_, P> {
    /// Apply options to this call only.
    pub fn with_override(mut self, call: impl Into<CallOverride>) -> Self {
        self.call = Some(call.into());
        self
    }

    /// Build the executor for this call.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the merged configuration is invalid.
    pub fn executor(self) -> std::result::Result<RequestExecutor<P>, ConfigError> {
        RequestExecutor::from_registry(self.registry, self.protocol, self.call.as_ref())
    }

    /// Run the unit of work, blocking the thread between attempts.
    ///
    /// An invalid configuration is returned through `E` before the first
    /// attempt.
    pub fn run<T, E, F>(self, mut work: F) -> std::result::Result<T, E>
    where
        P: SoftThrottle<T>,
        E: Failure + From<ConfigError>,
        F: FnMut() -> std::result::Result<T, E>,
    {
        let timer = CallTimer::start();
        let protocol = self.protocol.name();
        let executor = self.executor()?;

        let mut attempts = 0;
        let result = executor.run(|| {
            attempts += 1;
            work()
        });

        log_outcome(protocol, attempts, &timer, &result);
        result
    }

    /// Run the unit of work, waiting on the tokio timer between attempts.
    pub async fn run_async<T, E, F, Fut>(self, mut work: F) -> std::result::Result<T, E>
    where
        P: SoftThrottle<T>,
        E: Failure + From<ConfigError>,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let timer = CallTimer::start();
        let protocol = self.protocol.name();
        let executor = self.executor()?;

        let mut attempts = 0;
        let result = executor
            .run_async(|| {
                attempts += 1;
                work()
            })
            .await;

        log_outcome(protocol, attempts, &timer, &result);
        result
    }
}

impl Call<'_, Rest> {
    /// Send a request, retrying according to the configuration.
    ///
    /// `build_request` is called once per attempt. Non-success statuses
    /// become [`Error::Status`].
    pub async fn send<F>(self, mut build_request: F) -> Result<reqwest::Response>
    where
        F: FnMut() -> reqwest::RequestBuilder,
    {
        self.run_async(|| {
            let request = build_request();
            async move { ensure_success(request.send().await?).await }
        })
        .await
    }
}

impl Call<'_, Graphql> {
    /// Post a GraphQL document and return the parsed response.
    ///
    /// Throttled responses are retried after the cost-derived wait. Once the
    /// attempts are used up the last (throttled) response is returned.
    pub async fn query(self, client: &reqwest::Client, url: &str, body: &Value) -> Result<Value> {
        self.run_async(|| {
            let request = client.post(url).json(body);
            async move {
                let response = ensure_success(request.send().await?).await?;
                let bytes = response.bytes().await?;
                let value: Value = serde_json::from_slice(&bytes)?;
                Ok::<_, Error>(value)
            }
        })
        .await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(Error::Status(HttpFailure::from_response(response).await))
    }
}

fn log_outcome<T, E: Display>(
    protocol: &'static str,
    attempts: u32,
    timer: &CallTimer,
    result: &std::result::Result<T, E>,
) {
    let metadata = CallMetadata::new(protocol, timer.elapsed()).with_attempts(attempts);
    match result {
        Ok(_) => metadata.log_success(),
        Err(e) => metadata.log_error(&e.to_string()),
    }
}
