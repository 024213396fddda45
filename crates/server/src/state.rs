use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::telemetry::PrometheusMetrics;
use matcher::DuplicateDetector;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use triage::{PipelineOrchestrator, TriageConfig, WarmupReport};

/// Shared application state
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Report pipeline (shared across requests)
    pub pipeline: Arc<PipelineOrchestrator>,

    /// Duplicate detector sharing the pipeline's embedding provider
    pub detector: Arc<DuplicateDetector>,

    /// Threshold used when a request does not send one
    pub duplicate_threshold: f32,

    /// Prometheus render handle, when the recorder is installed
    pub prometheus: Option<PrometheusHandle>,

    ready: AtomicBool,
    warmup: RwLock<Option<WarmupReport>>,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        pipeline: PipelineOrchestrator,
        detector: DuplicateDetector,
        duplicate_threshold: f32,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            detector: Arc::new(detector),
            duplicate_threshold,
            prometheus: None,
            ready: AtomicBool::new(false),
            warmup: RwLock::new(None),
        }
    }

    /// Builds the pipeline and detector from a triage config. Models are not
    /// contacted until warm-up or the first request.
    pub fn from_triage_config(config: ServerConfig, triage: &TriageConfig) -> ServerResult<Self> {
        let pipeline = PipelineOrchestrator::from_config(triage)
            .map_err(|e| ServerError::Config(e.to_string()))?
            .with_metrics(Arc::new(PrometheusMetrics));
        let detector = DuplicateDetector::new(Arc::clone(pipeline.embeddings()))
            .with_metrics(Arc::new(PrometheusMetrics));

        Ok(Self::new(
            config,
            pipeline,
            detector,
            triage.duplicates.threshold,
        ))
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Marks the service ready, keeping the warm-up report if one was run.
    pub async fn mark_ready(&self, report: Option<WarmupReport>) {
        *self.warmup.write().await = report;
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub async fn warmup_report(&self) -> Option<WarmupReport> {
        self.warmup.read().await.clone()
    }
}
