//! Telemetry configuration from environment variables.

use std::env;

/// Default service name reported in logs.
pub const DEFAULT_SERVICE_NAME: &str = "explorer-sync";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Filter directive (`info`, `ex_02_live_list=debug,warn`, ...)
    pub log_level: String,

    /// Whether to attach the console layer at all
    pub console_output: bool,

    /// Whether console output is JSON instead of human-readable text
    pub json_logs: bool,

    /// Network embedders select when nothing else does
    pub network: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: None,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EXPLORER_LOG_LEVEL` or `RUST_LOG`: filter directive (default: info)
    /// - `EXPLORER_JSON_LOGS`: JSON output (default: false, true in containers)
    /// - `EXPLORER_CONSOLE_OUTPUT`: attach the console layer (default: true)
    /// - `EXPLORER_SERVICE_NAME`: service name (default: explorer-sync)
    /// - `EXPLORER_NETWORK`: default network identifier (default: unset)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("EXPLORER_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),

            log_level: lookup("EXPLORER_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            console_output: lookup("EXPLORER_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("EXPLORER_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            network: lookup("EXPLORER_NETWORK").filter(|v| !v.trim().is_empty()),
        }
    }
}
