//! Logging and Prometheus wiring for the server process.

use matcher::MatchMetrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use semantic::BackendKind;
use std::time::Duration;
use triage::{PipelineMetrics, Stage};

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// JSON logs filtered by `RUST_LOG`, falling back to `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // A second install (e.g. from tests) is a no-op.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .try_init();
}

/// Installs the global Prometheus recorder. Only one per process.
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)?
        .install_recorder()?;
    Ok(handle)
}

/// Forwards pipeline and duplicate-detection observations to the `metrics`
/// facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl PipelineMetrics for PrometheusMetrics {
    fn record_stage(&self, stage: Stage, latency: Duration, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        metrics::counter!("triage_stage_total", "stage" => stage.as_str(), "outcome" => outcome)
            .increment(1);
        metrics::histogram!("triage_stage_duration_seconds", "stage" => stage.as_str())
            .record(latency.as_secs_f64());
    }
}

impl MatchMetrics for PrometheusMetrics {
    fn record_detection(
        &self,
        backend: Option<BackendKind>,
        latency: Duration,
        candidate_count: usize,
        match_count: usize,
    ) {
        let backend = backend.map(|b| b.as_str()).unwrap_or("none");
        metrics::counter!("triage_duplicate_checks_total", "backend" => backend).increment(1);
        metrics::histogram!("triage_duplicate_check_duration_seconds", "backend" => backend)
            .record(latency.as_secs_f64());
        metrics::histogram!("triage_duplicate_candidates").record(candidate_count as f64);
        if match_count > 0 {
            metrics::counter!("triage_duplicates_found_total").increment(match_count as u64);
        }
    }
}
