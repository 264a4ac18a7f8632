//! Prometheus metrics for the ingestion pipeline.
//!
//! All metrics follow the naming convention: `parley_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., messages_imported_total)
//! - **Histogram**: Distribution of values (e.g., receive_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Envelopes handed to `receive`
    pub static ref ENVELOPES_RECEIVED: Counter = Counter::new(
        "parley_ingestion_envelopes_received_total",
        "Total envelopes handed to the ingestion pipeline"
    ).expect("metric creation failed");

    /// Messages fully imported
    pub static ref MESSAGES_IMPORTED: Counter = Counter::new(
        "parley_ingestion_messages_imported_total",
        "Total messages decrypted, parsed and persisted"
    ).expect("metric creation failed");

    /// Import failures by pipeline stage
    pub static ref IMPORT_FAILURES: CounterVec = CounterVec::new(
        Opts::new("parley_ingestion_failures_total", "Envelopes dropped, by failing stage"),
        &["stage"]  // stage: sender_id/decrypt/parse/sender_binding/resolve_identity/...
    ).expect("metric creation failed");

    /// Identities created on first contact
    pub static ref IDENTITIES_CREATED: Counter = Counter::new(
        "parley_ingestion_identities_created_total",
        "Identities created for previously unknown public keys"
    ).expect("metric creation failed");

    /// Identities refreshed by a later message
    pub static ref IDENTITIES_UPDATED: Counter = Counter::new(
        "parley_ingestion_identities_updated_total",
        "Known identities resolved again (display name refreshed)"
    ).expect("metric creation failed");

    /// End-to-end `receive` duration
    pub static ref RECEIVE_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "parley_ingestion_receive_duration_seconds",
            "Time spent importing one envelope"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).unwrap())
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ENVELOPES_RECEIVED.clone()),
        Box::new(MESSAGES_IMPORTED.clone()),
        Box::new(IMPORT_FAILURES.clone()),
        Box::new(IDENTITIES_CREATED.clone()),
        Box::new(IDENTITIES_UPDATED.clone()),
        Box::new(RECEIVE_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Count one dropped envelope against `stage`.
pub fn record_failure(stage: &str) {
    IMPORT_FAILURES.with_label_values(&[stage]).inc();
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
