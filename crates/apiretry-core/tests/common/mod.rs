//! Common test utilities and helpers

use apiretry_core::executor::Sleeper;
use apiretry_core::failure::{Failure, FailureResponse};
use apiretry_core::key::RETRY_AFTER_HEADER;
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

/// Load a response fixture
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> serde_json::Value {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(manifest_dir)
        .join("tests")
        .join("fixtures")
        .join("responses")
        .join(format!("{}.json", name));

    let body = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!(
            "Failed to load response fixture '{}' from {:?}: {}",
            name, path, e
        )
    });
    serde_json::from_str(&body).expect("fixture is not valid JSON")
}

/// An HTTP client error carrying a status and an optional `Retry-After`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Response code = {status}")]
pub struct ClientError {
    pub status: u16,
    pub retry_after: Option<String>,
}

#[allow(dead_code)]
impl ClientError {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, value: &str) -> Self {
        self.retry_after = Some(value.to_string());
        self
    }
}

impl FailureResponse for ClientError {
    fn status(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case(RETRY_AFTER_HEADER) {
            self.retry_after.as_deref()
        } else {
            None
        }
    }
}

impl Failure for ClientError {
    fn response(&self) -> Option<&dyn FailureResponse> {
        Some(self)
    }
}

/// A failure with no response attached.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("zOMG!@#")]
pub struct RuntimeError;

impl Failure for RuntimeError {}

/// Records requested waits instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: RefCell<Vec<Duration>>,
}

#[allow(dead_code)]
impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.waits.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> Duration {
        self.waits.borrow_mut().push(duration);
        duration
    }
}
