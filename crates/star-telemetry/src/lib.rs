//! # Star Telemetry
//!
//! Logging and metrics for Star-Relay clusters.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` registry with an `EnvFilter` and either a
//!   pretty or a JSON formatter
//! - **Metrics**: Prometheus counters and histograms in a global registry,
//!   exported as text with [`encode_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use star_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STAR_SERVICE_NAME` | `star-relay` | Service name in logs |
//! | `STAR_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `STAR_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `STAR_JSON_LOGS` | `false` | JSON formatted logs |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, FABRIC_BYTES, FABRIC_MESSAGES, REGISTRY,
    RELAY_RUNS, TASK_DURATION, TASK_FAILURES,
};
pub use tracing_setup::env_filter;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
/// Calling it again keeps the logging and metrics already in place.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// Service name logs are attributed to.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
