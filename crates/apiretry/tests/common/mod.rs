//! Common test utilities and helpers

use std::path::Path;

/// Load a response fixture
#[allow(dead_code)]
pub fn load_response_fixture(name: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(manifest_dir)
        .join("tests")
        .join("fixtures")
        .join("responses")
        .join(format!("{}.json", name));

    std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!(
            "Failed to load response fixture '{}' from {:?}: {}",
            name, path, e
        )
    })
}

/// A throttled GraphQL body whose cost wait is `(requested - available) / restore_rate`
#[allow(dead_code)]
pub fn throttled_body(requested: u32, available: u32, restore_rate: f64) -> serde_json::Value {
    serde_json::json!({
        "errors": [{ "message": "Throttled" }],
        "extensions": {
            "cost": {
                "requestedQueryCost": requested,
                "actualQueryCost": null,
                "throttleStatus": {
                    "maximumAvailable": 1000.0,
                    "currentlyAvailable": available,
                    "restoreRate": restore_rate
                }
            }
        }
    })
}

/// Route engine logs to the test output, filtered by `RUST_LOG`
#[allow(dead_code)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
