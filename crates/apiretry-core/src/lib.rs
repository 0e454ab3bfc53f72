#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry policy engine for rate-limited and cost-throttled API calls.
//!
//! This crate decides, for each failed or throttled attempt of a call,
//! whether to try again and how long to wait first:
//!
//! - **Configuration** via [`ConfigRegistry`](config::ConfigRegistry): process-wide
//!   defaults plus per-key handlers, snapshotted into a
//!   [`ConfigurationTable`](config::ConfigurationTable) for every call
//! - **Resolution** via [`HandlerResolver`](resolve::HandlerResolver): error kind,
//!   then exact status (`"503"`), then status class (`"5XX"`)
//! - **Backoff** via [`WaitStrategy`](backoff::WaitStrategy): fixed waits, the
//!   `Retry-After` header, or the query-cost restore time
//! - **Execution** via [`RequestExecutor`](executor::RequestExecutor), blocking
//!   or on the tokio timer
//!
//! # Examples
//!
//! ```rust
//! use apiretry_core::prelude::*;
//!
//! let mut registry = ConfigRegistry::new();
//! registry.on("5XX", HandlerOptions::new().tries(3).wait(0.0));
//!
//! let result = RequestExecutor::from_registry(&registry, Rest, None)
//!     .unwrap()
//!     .run(|| Ok::<_, std::io::Error>(42));
//!
//! assert_eq!(result.unwrap(), 42);
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod executor;
pub mod failure;
pub mod key;
pub mod protocol;
pub mod resolve;
pub mod telemetry;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use apiretry_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        CallOverride, ConfigRegistry, ConfigurationTable, HandlerOptions, HandlerSpec,
        RegistrySettings,
    };
    pub use crate::error::ConfigError;
    pub use crate::executor::{RequestExecutor, Sleeper, ThreadSleeper};
    pub use crate::failure::{Failure, FailureResponse};
    pub use crate::key::ClassificationKey;
    pub use crate::protocol::{Graphql, Protocol, Rest, SoftThrottle};
}
