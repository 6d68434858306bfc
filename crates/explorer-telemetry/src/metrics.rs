//! Prometheus text exposition.
//!
//! Subsystems register their counters in the default registry when built
//! with their `metrics` feature; this module renders whatever is there.

use crate::TelemetryError;
use prometheus::{Encoder, TextEncoder};

/// Encode every registered metric in the Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}
