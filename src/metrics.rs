// Metrics hooks for the triage pipeline.
//
// A `PipelineMetrics` implementation passed to
// `PipelineOrchestrator::with_metrics` receives per-stage latency and
// success for every request.
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline stages that report timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Summarize,
    Entities,
    Embed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Summarize => "summarize",
            Stage::Entities => "entities",
            Stage::Embed => "embed",
        }
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    /// `ok` is false for hard failures and for degraded optional stages.
    fn record_stage(&self, stage: Stage, latency: Duration, ok: bool);
}

pub(crate) struct StageTimer {
    recorder: Option<Arc<dyn PipelineMetrics>>,
    stage: Stage,
    start: Instant,
}

impl StageTimer {
    pub(crate) fn start(recorder: Option<&Arc<dyn PipelineMetrics>>, stage: Stage) -> Self {
        Self {
            recorder: recorder.cloned(),
            stage,
            start: Instant::now(),
        }
    }

    pub(crate) fn finish(self, ok: bool) {
        if let Some(recorder) = self.recorder {
            recorder.record_stage(self.stage, self.start.elapsed(), ok);
        }
    }
}

/// Runs `fut` and reports its latency and success under `stage`.
pub(crate) async fn timed<T, E, F>(
    recorder: Option<&Arc<dyn PipelineMetrics>>,
    stage: Stage,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let timer = StageTimer::start(recorder, stage);
    let result = fut.await;
    timer.finish(result.is_ok());
    result
}
