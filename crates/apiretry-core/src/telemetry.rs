//! Throttle telemetry embedded in cost-metered (GraphQL) responses.
//!
//! A throttled response still parses as a normal result. The only sign of
//! throttling is the `extensions.cost` block:
//!
//! ```json
//! {
//!   "errors": [{ "message": "Throttled" }],
//!   "extensions": {
//!     "cost": {
//!       "requestedQueryCost": 250,
//!       "actualQueryCost": null,
//!       "throttleStatus": {
//!         "maximumAvailable": 1000.0,
//!         "currentlyAvailable": 50,
//!         "restoreRate": 50.0
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A present `actualQueryCost` means the query ran.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a response says about throttling.
#[derive(Debug, Clone, PartialEq)]
pub enum Inspection {
    /// The request was serviced (or carries no cost information).
    Serviced,

    /// The request was not serviced because of throttling.
    Throttled(ThrottleSignal),

    /// The payload could not be analysed. It is returned as-is.
    Degraded(String),
}

/// Cost numbers of a throttled request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleSignal {
    /// Cost the query asked for
    pub requested: f64,
    /// Points available when the query was rejected
    pub available: f64,
    /// Points restored per second
    pub restore_rate: f64,
    /// Bucket size, when reported
    pub maximum_available: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    extensions: Option<Extensions>,
}

#[derive(Debug, Deserialize)]
struct Extensions {
    #[serde(default)]
    cost: Option<QueryCost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryCost {
    #[serde(default)]
    requested_query_cost: Option<f64>,
    #[serde(default)]
    actual_query_cost: Option<f64>,
    #[serde(default)]
    throttle_status: Option<ThrottleStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThrottleStatus {
    #[serde(default)]
    maximum_available: Option<f64>,
    #[serde(default)]
    currently_available: Option<f64>,
    #[serde(default)]
    restore_rate: Option<f64>,
}

/// Inspect any serializable response for throttle telemetry.
///
/// The value is normalized through `serde_json`; if that fails, or the
/// normalized value is not a JSON object, the result is
/// [`Inspection::Degraded`].
///
/// # Examples
///
/// ```rust
/// use apiretry_core::telemetry::{Inspection, inspect};
/// use serde_json::json;
///
/// assert_eq!(inspect(&json!({ "data": { "foo": 123 } })), Inspection::Serviced);
///
/// let throttled = json!({
///     "extensions": { "cost": {
///         "requestedQueryCost": 250,
///         "actualQueryCost": null,
///         "throttleStatus": { "currentlyAvailable": 50, "restoreRate": 50.0 }
///     }}
/// });
/// assert!(matches!(inspect(&throttled), Inspection::Throttled(_)));
/// ```
pub fn inspect<T: Serialize + ?Sized>(response: &T) -> Inspection {
    match serde_json::to_value(response) {
        Ok(value) => inspect_value(value),
        Err(e) => Inspection::Degraded(format!("response is not serializable: {e}")),
    }
}

/// Inspect an already normalized response.
pub fn inspect_value(value: Value) -> Inspection {
    if !value.is_object() {
        return Inspection::Degraded(format!("expected a JSON object, got {value}"));
    }

    let envelope: Envelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => return Inspection::Degraded(format!("unexpected cost telemetry: {e}")),
    };

    let Some(cost) = envelope.extensions.and_then(|extensions| extensions.cost) else {
        return Inspection::Serviced;
    };

    if cost.actual_query_cost.is_some() {
        return Inspection::Serviced;
    }

    let status = cost.throttle_status.as_ref();
    match (
        cost.requested_query_cost,
        status.and_then(|s| s.currently_available),
        status.and_then(|s| s.restore_rate),
    ) {
        (Some(requested), Some(available), Some(restore_rate)) if restore_rate > 0.0 => {
            Inspection::Throttled(ThrottleSignal {
                requested,
                available,
                restore_rate,
                maximum_available: status.and_then(|s| s.maximum_available),
            })
        }
        (Some(_), Some(_), Some(restore_rate)) => {
            Inspection::Degraded(format!("restore rate must be positive, got {restore_rate}"))
        }
        _ => Inspection::Degraded("incomplete throttle status".to_string()),
    }
}
