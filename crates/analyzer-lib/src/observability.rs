//! Observability for the evaluation engine
//!
//! Provides Prometheus metrics: per-step latency of each pipeline,
//! step and anomaly counters, and the current dynamic window length.

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;

/// Histogram buckets for per-step latency (in seconds); single-window
/// statistics are fast, so buckets start in the sub-microsecond range
const LATENCY_BUCKETS: &[f64] = &[
    0.0000001, 0.0000005, 0.000001, 0.000005, 0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct EngineMetricsInner {
    fixed_step_latency_seconds: Histogram,
    dynamic_step_latency_seconds: Histogram,
    steps_processed: IntCounter,
    anomalies_detected: IntCounterVec,
    dynamic_window_length: IntGauge,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            fixed_step_latency_seconds: register_histogram!(
                "traffic_analyzer_fixed_step_latency_seconds",
                "Time spent on the fixed-window pipeline per step",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fixed_step_latency_seconds"),

            dynamic_step_latency_seconds: register_histogram!(
                "traffic_analyzer_dynamic_step_latency_seconds",
                "Time spent on the dynamic-window pipeline per step",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register dynamic_step_latency_seconds"),

            steps_processed: register_int_counter!(
                "traffic_analyzer_steps_processed_total",
                "Total number of observations processed"
            )
            .expect("Failed to register steps_processed_total"),

            anomalies_detected: register_int_counter_vec!(
                "traffic_analyzer_anomalies_detected_total",
                "Total anomaly verdicts, labeled by pipeline",
                &["pipeline"]
            )
            .expect("Failed to register anomalies_detected_total"),

            dynamic_window_length: register_int_gauge!(
                "traffic_analyzer_dynamic_window_length",
                "Dynamic window length currently in effect"
            )
            .expect("Failed to register dynamic_window_length"),
        }
    }
}

/// Handle to the engine's Prometheus metrics.
///
/// Cheap to clone; all handles share the single global registration.
#[derive(Clone, Copy, Default)]
pub struct EngineMetrics;

impl EngineMetrics {
    pub fn new() -> Self {
        Self
    }

    fn inner(&self) -> &'static EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    /// Record the fixed pipeline's cost for one step
    pub fn observe_fixed_latency(&self, seconds: f64) {
        self.inner().fixed_step_latency_seconds.observe(seconds);
    }

    /// Record the dynamic pipeline's cost for one step
    pub fn observe_dynamic_latency(&self, seconds: f64) {
        self.inner().dynamic_step_latency_seconds.observe(seconds);
    }

    /// Count one processed step and its verdicts
    pub fn record_step(
        &self,
        fixed_anomaly: bool,
        dynamic_anomaly: bool,
        dynamic_window_length: usize,
    ) {
        let inner = self.inner();
        inner.steps_processed.inc();
        if fixed_anomaly {
            inner.anomalies_detected.with_label_values(&["fixed"]).inc();
        }
        if dynamic_anomaly {
            inner
                .anomalies_detected
                .with_label_values(&["dynamic"])
                .inc();
        }
        inner
            .dynamic_window_length
            .set(dynamic_window_length as i64);
    }
}
