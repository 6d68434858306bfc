//! # Explorer Telemetry
//!
//! Logging bootstrap and metrics exposition for the explorer sync core.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use explorer_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EXPLORER_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `EXPLORER_JSON_LOGS` | `false` (true in containers) | JSON output |
//! | `EXPLORER_CONSOLE_OUTPUT` | `true` | Attach the console layer |
//! | `EXPLORER_SERVICE_NAME` | `explorer-sync` | Service name |
//! | `EXPLORER_NETWORK` | unset | Default network identifier |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{build_filter, init_logging};
pub use metrics::encode_metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("Logging already initialized")]
    AlreadyInitialized,

    /// The filter directive does not parse.
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// Metrics could not be encoded.
    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}
