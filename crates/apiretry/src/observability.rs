//! Structured logging for retried calls.
//!
//! Every call made through a [`Call`](crate::Call) is logged once it settles.
//! Individual retries are logged by the engine at `debug` level.

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Summary of one settled call.
#[derive(Debug, Clone)]
pub struct CallMetadata {
    /// Protocol name (`rest`, `graphql`)
    pub protocol: &'static str,
    /// Number of times the unit of work ran
    pub attempts: u32,
    /// Time elapsed for the whole call, waits included
    pub elapsed: Duration,
}

impl CallMetadata {
    /// Create new call metadata
    pub fn new(protocol: &'static str, elapsed: Duration) -> Self {
        Self {
            protocol,
            attempts: 0,
            elapsed,
        }
    }

    /// Set the number of attempts
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Number of retries, i.e. attempts after the first one
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Log successful call
    pub fn log_success(&self) {
        info!(
            protocol = self.protocol,
            attempts = self.attempts,
            retries = self.retries(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "call succeeded"
        );
    }

    /// Log failed call
    pub fn log_error(&self, error: &str) {
        warn!(
            protocol = self.protocol,
            attempts = self.attempts,
            retries = self.retries(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            error = %error,
            "call failed"
        );
    }
}

/// Timer for measuring call duration
#[derive(Debug)]
pub struct CallTimer {
    start: Instant,
}

impl CallTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "trace")]
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .is_ok()
}
