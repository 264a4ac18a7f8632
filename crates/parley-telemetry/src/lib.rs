//! # Parley Telemetry
//!
//! Observability for the message-ingestion pipeline.
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, pretty for
//!   development or JSON for log shippers
//! - **Metrics**: Prometheus counters and histograms in a crate-level registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parley_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! // envelopes received from now on are logged and counted
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PARLEY_SERVICE_NAME` | `parley` | Service name on every log line |
//! | `PARLEY_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `PARLEY_JSON_LOGS` | `false` | Emit JSON instead of pretty logs |
//! | `PARLEY_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, record_failure, register_metrics, HistogramTimer, MetricsHandle,
    ENVELOPES_RECEIVED, IDENTITIES_CREATED, IDENTITIES_UPDATED, IMPORT_FAILURES,
    MESSAGES_IMPORTED, RECEIVE_DURATION, REGISTRY,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}
