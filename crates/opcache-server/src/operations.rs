//! Built-in operations served by the cache.
//!
//! These give operators something to exercise the cache with out of the
//! box. Real deployments register their own [`Operation`] implementations
//! next to or instead of these.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use opcache::{Error, Operation, OperationRegistry, Result};

/// Longest artificial delay `simulate_work` accepts, in milliseconds.
const SIMULATED_WORK_MAX_MS: u64 = 10_000;

/// Echoes its parameters back.
///
/// Useful for verifying key derivation: identical parameter sets hit the
/// same entry regardless of field order.
pub struct EchoOperation;

#[async_trait]
impl Operation for EchoOperation {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given parameters back"
    }

    async fn run(&self, params: &Map<String, Value>) -> Result<Value> {
        Ok(json!({ "echo": Value::Object(params.clone()) }))
    }
}

/// Returns the current UTC time.
///
/// A cached clock makes TTL behavior visible: the timestamp freezes for
/// the entry's lifetime and jumps forward after expiry.
pub struct CurrentTimeOperation;

#[async_trait]
impl Operation for CurrentTimeOperation {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Current UTC time, frozen per cache entry until its TTL elapses"
    }

    async fn run(&self, _params: &Map<String, Value>) -> Result<Value> {
        Ok(json!({ "utc": chrono::Utc::now().to_rfc3339() }))
    }
}

/// Sleeps for `duration_ms` and returns the given payload.
///
/// Stands in for an expensive upstream call: the first execution takes
/// the full delay, repeats come back instantly from the cache.
pub struct SimulateWorkOperation;

#[async_trait]
impl Operation for SimulateWorkOperation {
    fn name(&self) -> &str {
        "simulate_work"
    }

    fn description(&self) -> &str {
        "Sleep for duration_ms, then return the payload parameter"
    }

    async fn run(&self, params: &Map<String, Value>) -> Result<Value> {
        let duration_ms = params
            .get("duration_ms")
            .and_then(Value::as_u64)
            .unwrap_or(100);
        if duration_ms > SIMULATED_WORK_MAX_MS {
            return Err(Error::executor(format!(
                "duration_ms must be at most {SIMULATED_WORK_MAX_MS}"
            )));
        }
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        let payload = params.get("payload").cloned().unwrap_or(Value::Null);
        Ok(json!({
            "payload": payload,
            "computed_in_ms": duration_ms,
        }))
    }
}

/// Registry preloaded with every built-in operation.
pub fn builtin_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();
    registry.register(Arc::new(EchoOperation));
    registry.register(Arc::new(CurrentTimeOperation));
    registry.register(Arc::new(SimulateWorkOperation));
    registry
}
