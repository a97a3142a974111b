//! Structured logging and Prometheus metrics for the token-authentication
//! engine: a small adapter crate implementing `tpa_core::MetricsSink`
//! and wiring up `tracing`.

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::LoggingGuard;
pub use metrics::{encode_metrics, register_metrics, MetricsHandle, PrometheusMetrics};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics together. Returns a guard that must be
/// held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let logging_guard = logging::init_logging(&config)?;
    Ok(TelemetryGuard {
        _logging: logging_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active; dropping it is inert but keeps the
/// handles alive for the caller's chosen scope.
pub struct TelemetryGuard {
    _logging: LoggingGuard,
    _metrics: MetricsHandle,
}
