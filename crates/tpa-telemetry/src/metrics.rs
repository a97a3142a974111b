//! Prometheus metrics for the token-authentication engine.
//!
//! All metrics follow the naming convention `tpa_<event>_total`.

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Registry, TextEncoder};
use std::sync::Arc;
use tpa_core::MetricsSink;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Packets or UPDATE branches that failed verification.
    pub static ref VERIFY_FAILED: Counter = Counter::new(
        "tpa_verify_failed_total",
        "Total packets or branches rejected by cryptographic verification"
    ).expect("metric creation failed");

    /// Packets rejected as replays.
    pub static ref REPLAY_REJECTED: Counter = Counter::new(
        "tpa_replay_rejected_total",
        "Total packets rejected as outside the anti-replay window"
    ).expect("metric creation failed");

    /// UPDATE Msg-2s with no matching cache entry.
    pub static ref UPDATE_CACHE_MISS: Counter = Counter::new(
        "tpa_update_cache_miss_total",
        "Total UPDATE acknowledgements referencing an unknown sequence number"
    ).expect("metric creation failed");

    /// Anchor or tree transitions applied to an SA.
    pub static ref ANCHOR_TRANSITIONED: Counter = Counter::new(
        "tpa_anchor_transitioned_total",
        "Total chain or tree anchor transitions"
    ).expect("metric creation failed");
}

/// Handle for the metrics registry; held for the process lifetime.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register every metric with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(VERIFY_FAILED.clone()),
        Box::new(REPLAY_REJECTED.clone()),
        Box::new(UPDATE_CACHE_MISS.clone()),
        Box::new(ANCHOR_TRANSITIONED.clone()),
    ];
    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode every registered metric as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// The `MetricsSink` implementation backing the global Prometheus counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl MetricsSink for PrometheusMetrics {
    fn verify_failed(&self) {
        VERIFY_FAILED.inc();
    }
    fn replay_rejected(&self) {
        REPLAY_REJECTED.inc();
    }
    fn update_cache_miss(&self) {
        UPDATE_CACHE_MISS.inc();
    }
    fn anchor_transitioned(&self) {
        ANCHOR_TRANSITIONED.inc();
    }
}
