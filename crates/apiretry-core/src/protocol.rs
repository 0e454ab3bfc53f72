//! Protocol variants sharing the retry loop.
//!
//! A protocol decides two things: which entry bare per-call options apply to,
//! and whether a successful return value is really a soft throttle.

use crate::key::{GRAPHQL_KEY, RATE_LIMIT_KEY};
use crate::telemetry::{self, Inspection};
use serde::Serialize;

/// A request protocol.
pub trait Protocol {
    /// Key that bare `tries`/`wait` overrides apply to.
    fn primary_key(&self) -> &'static str;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Inspection of successful values for throttling.
pub trait SoftThrottle<T>: Protocol {
    /// Look at a successful return value.
    fn inspect(&self, value: &T) -> Inspection;
}

/// Plain REST calls: only raised failures are retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rest;

impl Protocol for Rest {
    fn primary_key(&self) -> &'static str {
        RATE_LIMIT_KEY
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

impl<T> SoftThrottle<T> for Rest {
    fn inspect(&self, _value: &T) -> Inspection {
        Inspection::Serviced
    }
}

/// Cost-metered GraphQL calls: successful responses are also checked for
/// throttle telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Graphql;

impl Protocol for Graphql {
    fn primary_key(&self) -> &'static str {
        GRAPHQL_KEY
    }

    fn name(&self) -> &'static str {
        "graphql"
    }
}

impl<T: Serialize> SoftThrottle<T> for Graphql {
    fn inspect(&self, value: &T) -> Inspection {
        telemetry::inspect(value)
    }
}
