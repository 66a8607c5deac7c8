//! Prometheus metrics for Star-Relay clusters.
//!
//! All metrics follow the naming convention: `sr_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RELAY METRICS
    // =========================================================================

    /// Completed relay runs by routing case, counted once per node
    pub static ref RELAY_RUNS: CounterVec = CounterVec::new(
        Opts::new("sr_relay_runs_total", "Completed relay runs by routing case"),
        &["case"]
    ).expect("metric creation failed");

    // =========================================================================
    // FABRIC METRICS
    // =========================================================================

    /// Envelopes handed to the fabric
    pub static ref FABRIC_MESSAGES: Counter = Counter::new(
        "sr_fabric_messages_total",
        "Total envelopes sent through the fabric"
    ).expect("metric creation failed");

    /// Encoded body bytes handed to the fabric
    pub static ref FABRIC_BYTES: Counter = Counter::new(
        "sr_fabric_bytes_total",
        "Total encoded body bytes sent through the fabric"
    ).expect("metric creation failed");

    // =========================================================================
    // TASK METRICS
    // =========================================================================

    /// Lifecycle failures by task
    pub static ref TASK_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sr_task_failures_total", "Task lifecycle failures by task"),
        &["task"]
    ).expect("metric creation failed");

    /// Time spent driving a task through its lifecycle
    pub static ref TASK_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sr_task_duration_seconds",
            "Time spent executing a task on one node"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("bucket creation failed")),
        &["task"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Relay
        Box::new(RELAY_RUNS.clone()),
        // Fabric
        Box::new(FABRIC_MESSAGES.clone()),
        Box::new(FABRIC_BYTES.clone()),
        // Tasks
        Box::new(TASK_FAILURES.clone()),
        Box::new(TASK_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
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

    /// Start a timer on the duration histogram of `task`.
    pub fn for_task(task: &str) -> Self {
        Self::new(&TASK_DURATION.with_label_values(&[task]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
