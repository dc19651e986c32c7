//! Metrics for gateway traffic and health scores.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder; without one every call is a no-op.

use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};

/// Counter of gateway calls, labelled by operation and status
pub const GATEWAY_OPERATIONS_TOTAL: &str = "declutter_gateway_operations_total";
/// Histogram of gateway call latency, labelled by operation
pub const GATEWAY_OPERATION_DURATION: &str = "declutter_gateway_operation_duration_seconds";
/// Gauge holding the most recently computed health score
pub const HEALTH_SCORE: &str = "declutter_health_score";

/// Record one gateway call
pub fn record_gateway_operation(operation: &'static str, duration: Duration, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(GATEWAY_OPERATIONS_TOTAL, "operation" => operation, "status" => status).increment(1);
    histogram!(GATEWAY_OPERATION_DURATION, "operation" => operation).record(duration.as_secs_f64());
}

/// Publish the latest health score
pub fn record_health_score(score: u8) {
    gauge!(HEALTH_SCORE).set(f64::from(score));
}

/// Times a gateway call and records it on [`GatewayTimer::finish`]
#[derive(Debug)]
pub struct GatewayTimer {
    operation: &'static str,
    start: Instant,
}

impl GatewayTimer {
    /// Start timing `operation`
    #[must_use]
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Stop timing and record the outcome
    pub fn finish(self, success: bool) -> Duration {
        let duration = self.start.elapsed();
        record_gateway_operation(self.operation, duration, success);
        tracing::debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            success,
            "gateway call finished"
        );
        duration
    }
}
