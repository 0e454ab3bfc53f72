//! Error types for HTTP calls made through a [`Retrier`](crate::Retrier).
//!
//! Every variant is a [`Failure`], so the retry engine can classify it:
//! non-success responses by status, everything else by error kind.

use crate::http_failure::HttpFailure;
use apiretry_core::error::ConfigError;
use apiretry_core::failure::{Failure, FailureResponse};
use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for HTTP calls.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error(transparent)]
    Status(#[from] HttpFailure),

    /// The request could not be sent or the response not read.
    ///
    /// Classified under the kind of [`reqwest::Error`]; register
    /// `ClassificationKey::of::<reqwest::Error>()` to retry connection errors.
    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Failed to parse API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The retry configuration was rejected before the first attempt.
    #[error("Invalid retry configuration: {0}")]
    Config(#[from] ConfigError),
}

impl Failure for Error {
    fn kind(&self) -> Cow<'_, str> {
        match self {
            Error::Status(failure) => failure.kind(),
            Error::Transport(_) => Cow::Borrowed(std::any::type_name::<reqwest::Error>()),
            Error::Decode(_) => Cow::Borrowed(std::any::type_name::<serde_json::Error>()),
            Error::Config(_) => Cow::Borrowed(std::any::type_name::<ConfigError>()),
        }
    }

    fn response(&self) -> Option<&dyn FailureResponse> {
        match self {
            Error::Status(failure) => Some(failure),
            _ => None,
        }
    }
}

impl Error {
    /// Status of a non-success response.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Error::Status(failure) => Some(failure.status()),
            _ => None,
        }
    }
}
