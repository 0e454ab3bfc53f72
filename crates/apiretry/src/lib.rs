#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry rate-limited REST calls and cost-throttled GraphQL calls.
//!
//! A [`Retrier`] owns the retry configuration. Each call snapshots it, applies
//! optional per-call overrides and runs the unit of work until it succeeds or
//! the matching handler runs out of attempts:
//!
//! - HTTP `429` responses wait for their `Retry-After` header
//! - other statuses match exact codes (`"503"`) or classes (`"5XX"`)
//! - other failures match their error kind
//! - GraphQL responses that were throttled wait for the cost bucket to refill
//!
//! The original failure (or, for GraphQL, the last throttled response) is
//! returned unchanged once the attempts are used up.
//!
//! # Examples
//!
//! ```rust,no_run
//! use apiretry::{CallOverride, HandlerOptions, Retrier};
//!
//! # async fn example() -> apiretry::Result<()> {
//! let mut retrier = Retrier::new();
//! retrier.configure(|config| {
//!     config.on("5XX", HandlerOptions::new().tries(3).wait(1.0));
//! });
//!
//! let client = reqwest::Client::new();
//! let response = retrier
//!     .rest()
//!     .with_override(CallOverride::table().tries(5))
//!     .send(|| client.get("https://example.myshopify.com/admin/api/2024-01/shop.json"))
//!     .await?;
//! println!("{}", response.status());
//!
//! let shop = retrier
//!     .graphql()
//!     .query(
//!         &client,
//!         "https://example.myshopify.com/admin/api/2024-01/graphql.json",
//!         &serde_json::json!({ "query": "{ shop { name } }" }),
//!     )
//!     .await?;
//! println!("{shop}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http_failure;
pub mod observability;
pub mod retrier;

pub use error::{Error, Result};
pub use http_failure::HttpFailure;
pub use retrier::{Call, Retrier};

pub use apiretry_core::config::{
    CallOverride, ConfigRegistry, ConfigurationTable, HandlerOptions, HandlerSpec,
    RegistrySettings,
};
pub use apiretry_core::error::ConfigError;
pub use apiretry_core::failure::{Failure, FailureResponse};
pub use apiretry_core::key::ClassificationKey;
pub use apiretry_core::protocol::{Graphql, Rest};

#[cfg(feature = "trace")]
pub use observability::init_tracing;
