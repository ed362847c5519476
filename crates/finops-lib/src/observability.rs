//! Observability for the savings pipeline
//!
//! Provides:
//! - Prometheus metrics (stage latency, records, candidates per kind, floor drops)
//! - Structured logging with stable `event` names

use crate::models::ActionKind;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for stage latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PipelineMetricsInner> = OnceLock::new();

struct PipelineMetricsInner {
    stage_latency_seconds: HistogramVec,
    records_loaded: IntGauge,
    records_dropped: IntCounter,
    candidates_generated: IntCounterVec,
    actions_ranked: IntGauge,
    actions_below_floor: IntCounter,
    duplicates_removed: IntCounter,
    generator_failures: IntCounterVec,
}

impl PipelineMetricsInner {
    fn new() -> Self {
        Self {
            stage_latency_seconds: register_histogram_vec!(
                "finops_stage_latency_seconds",
                "Time spent in each pipeline stage",
                &["stage"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register stage_latency_seconds"),

            records_loaded: register_int_gauge!(
                "finops_records_loaded",
                "Usage records in the current store snapshot"
            )
            .expect("Failed to register records_loaded"),

            records_dropped: register_int_counter!(
                "finops_records_dropped_total",
                "Raw rows dropped for lack of an identifier or class"
            )
            .expect("Failed to register records_dropped"),

            candidates_generated: register_int_counter_vec!(
                "finops_candidates_generated_total",
                "Action candidates emitted by the generators",
                &["kind"]
            )
            .expect("Failed to register candidates_generated"),

            actions_ranked: register_int_gauge!(
                "finops_actions_ranked",
                "Actions in the latest ranked list"
            )
            .expect("Failed to register actions_ranked"),

            actions_below_floor: register_int_counter!(
                "finops_actions_below_floor_total",
                "Deduplicated actions removed by the economic floor"
            )
            .expect("Failed to register actions_below_floor"),

            duplicates_removed: register_int_counter!(
                "finops_duplicates_removed_total",
                "Candidates discarded because another action won the resource"
            )
            .expect("Failed to register duplicates_removed"),

            generator_failures: register_int_counter_vec!(
                "finops_generator_failures_total",
                "Generator runs that returned an error",
                &["generator"]
            )
            .expect("Failed to register generator_failures"),
        }
    }
}

/// Lightweight handle to the global pipeline metrics
#[derive(Clone)]
pub struct PipelineMetrics {
    _private: (),
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PipelineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PipelineMetricsInner {
        GLOBAL_METRICS.get_or_init(PipelineMetricsInner::new)
    }

    pub fn observe_stage_latency(&self, stage: &str, duration_secs: f64) {
        self.inner()
            .stage_latency_seconds
            .with_label_values(&[stage])
            .observe(duration_secs);
    }

    pub fn set_records_loaded(&self, count: usize) {
        self.inner().records_loaded.set(count as i64);
    }

    pub fn inc_records_dropped(&self, count: usize) {
        self.inner().records_dropped.inc_by(count as u64);
    }

    pub fn inc_candidates(&self, kind: ActionKind, count: usize) {
        self.inner()
            .candidates_generated
            .with_label_values(&[kind.as_str()])
            .inc_by(count as u64);
    }

    pub fn set_actions_ranked(&self, count: usize) {
        self.inner().actions_ranked.set(count as i64);
    }

    pub fn inc_below_floor(&self, count: usize) {
        self.inner().actions_below_floor.inc_by(count as u64);
    }

    pub fn inc_duplicates_removed(&self, count: usize) {
        self.inner().duplicates_removed.inc_by(count as u64);
    }

    pub fn inc_generator_failures(&self, generator: &str) {
        self.inner()
            .generator_failures
            .with_label_values(&[generator])
            .inc();
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for pipeline events
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    /// `source` identifies the data set (directory, bucket, ...)
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_pipeline_started(&self, records: usize, advisor: usize, generators: usize) {
        info!(
            event = "pipeline_started",
            source = %self.source,
            records = records,
            advisor_rows = advisor,
            generators = generators,
            "Savings pipeline started"
        );
    }

    pub fn log_store_reloaded(&self, records: usize, dropped: usize, families: usize, prices: usize) {
        info!(
            event = "store_reloaded",
            source = %self.source,
            records = records,
            dropped = dropped,
            ladder_families = families,
            observed_prices = prices,
            "Usage store rebuilt"
        );
    }

    pub fn log_generator_completed(&self, generator: &str, candidates: usize, elapsed_ms: f64) {
        info!(
            event = "generator_completed",
            source = %self.source,
            generator = %generator,
            candidates = candidates,
            elapsed_ms = elapsed_ms,
            "Generator completed"
        );
    }

    pub fn log_generator_failed(&self, generator: &str, error: &anyhow::Error) {
        warn!(
            event = "generator_failed",
            source = %self.source,
            generator = %generator,
            error = %error,
            "Generator failed; continuing without its candidates"
        );
    }

    pub fn log_actions_ranked(&self, actions: usize, duplicates: usize, below_floor: usize) {
        info!(
            event = "actions_ranked",
            source = %self.source,
            actions = actions,
            duplicates_removed = duplicates,
            below_floor = below_floor,
            "Actions ranked"
        );
    }

    pub fn log_unknown_pricing_region(&self, region: &str) {
        warn!(
            event = "unknown_pricing_region",
            source = %self.source,
            region = %region,
            "No pricing location for region; using observed prices"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_is_shared() {
        let metrics = PipelineMetrics::new();
        let clone = metrics.clone();
        metrics.inc_candidates(ActionKind::Downsize, 2);
        clone.inc_generator_failures("spot");
        clone.observe_stage_latency("rank", 0.002);

        let text = metrics.render();
        assert!(text.contains("finops_candidates_generated_total"));
        assert!(text.contains("finops_generator_failures_total"));
        assert!(text.contains("finops_stage_latency_seconds"));
    }

    #[test]
    fn test_logger_does_not_panic_without_subscriber() {
        let logger = StructuredLogger::new("test");
        logger.log_pipeline_started(1, 0, 9);
        logger.log_generator_failed("spot", &anyhow::anyhow!("boom"));
        logger.log_unknown_pricing_region("us-gov-west-1");
    }
}
