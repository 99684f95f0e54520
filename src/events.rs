//! Structured lifecycle events for external observability.
//!
//! Events ride on the tracing pipeline under the `events` target. Emission is
//! best-effort: a payload that fails to serialize is downgraded to a debug
//! line and never aborts the run.
use serde::Serialize;

/// Emit one lifecycle event with a serializable payload.
pub fn emit<T: Serialize>(event: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            tracing::info!(target: "events", event, payload = %json, "pipeline event");
        }
        Err(err) => {
            tracing::debug!(target: "events", event, %err, "event payload not serializable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        week: i64,
    }

    #[test]
    fn emit_never_panics() {
        emit("plan", &Payload { week: 5 });
    }
}
