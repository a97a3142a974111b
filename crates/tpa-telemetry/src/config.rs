//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// Whether to enable console output (for development).
    pub console_output: bool,
    /// Whether to enable JSON formatted logs.
    pub json_logs: bool,
    /// Prometheus metrics port.
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "tpa-core".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Build configuration from environment variables.
    ///
    /// - `TPA_SERVICE_NAME`: service name (default: `tpa-core`)
    /// - `TPA_LOG_LEVEL` or `RUST_LOG`: log level (default: `info`)
    /// - `TPA_CONSOLE_OUTPUT`: enable console output (default: true)
    /// - `TPA_JSON_LOGS`: enable JSON logs (default: true inside a container)
    /// - `TPA_METRICS_PORT`: Prometheus metrics port (default: 9100)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("TPA_SERVICE_NAME").unwrap_or_else(|_| "tpa-core".to_string()),
            log_level: env::var("TPA_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            console_output: env::var("TPA_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
            json_logs: env::var("TPA_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
            metrics_port: env::var("TPA_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),
        }
    }
}
