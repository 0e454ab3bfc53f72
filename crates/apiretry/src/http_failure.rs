//! Non-success HTTP responses as classifiable failures.

use apiretry_core::failure::{Failure, FailureResponse};
use http::{HeaderMap, StatusCode};
use thiserror::Error;

/// An HTTP response with a non-success status.
///
/// Header lookups are case-insensitive.
///
/// # Examples
///
/// ```rust
/// use apiretry::HttpFailure;
/// use apiretry_core::failure::{Failure, FailureResponse};
/// use http::{HeaderMap, HeaderValue, StatusCode};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("retry-after", HeaderValue::from_static("3"));
///
/// let failure = HttpFailure::from_parts(StatusCode::TOO_MANY_REQUESTS, headers, "slow down");
/// let response = failure.response().unwrap();
/// assert_eq!(response.status(), 429);
/// assert_eq!(response.header("Retry-After"), Some("3"));
/// ```
#[derive(Debug, Clone, Error)]
#[error("Response code = {}", status.as_u16())]
pub struct HttpFailure {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl HttpFailure {
    /// Build a failure from response parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Consume a response, keeping its status, headers and body text.
    ///
    /// A body that cannot be read is recorded as empty.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status = status.as_u16(), error = %e, "could not read error body");
                String::new()
            }
        };

        Self {
            status,
            headers,
            body,
        }
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body text.
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl FailureResponse for HttpFailure {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

impl Failure for HttpFailure {
    fn response(&self) -> Option<&dyn FailureResponse> {
        Some(self)
    }
}
