//! The contract failures must satisfy to be classified.

use std::borrow::Cow;
use std::error::Error;

/// A failure raised by a unit of work.
///
/// The resolver looks at the failure's kind first and then, when the failure
/// carries an HTTP response, at its status code.
///
/// # Examples
///
/// ```rust
/// use apiretry_core::failure::{Failure, FailureResponse};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("Response code = {status}")]
/// struct ClientError {
///     status: u16,
/// }
///
/// impl FailureResponse for ClientError {
///     fn status(&self) -> u16 {
///         self.status
///     }
///
///     fn header(&self, _name: &str) -> Option<&str> {
///         None
///     }
/// }
///
/// impl Failure for ClientError {
///     fn response(&self) -> Option<&dyn FailureResponse> {
///         Some(self)
///     }
/// }
///
/// let err = ClientError { status: 429 };
/// assert_eq!(err.response().map(|r| r.status()), Some(429));
/// assert!(err.kind().ends_with("ClientError"));
/// ```
pub trait Failure: Error {
    /// Identifier matched against error-kind keys.
    ///
    /// Defaults to the fully-qualified type name, the same string
    /// [`ClassificationKey::of`](crate::key::ClassificationKey::of) produces.
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// The HTTP response that caused the failure, if any.
    fn response(&self) -> Option<&dyn FailureResponse> {
        None
    }
}

/// The part of an HTTP response the resolver and the backoff need.
pub trait FailureResponse {
    /// Numeric status code.
    fn status(&self) -> u16;

    /// Look up a header value by name.
    fn header(&self, name: &str) -> Option<&str>;
}

impl Failure for std::io::Error {}
