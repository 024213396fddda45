use inference::{
    EntityTagger, HfInferenceClient, ScoredLabel, SentimentLabel, SentimentModel, SentimentResult,
    SummaryModel, SummaryParams, ZeroShotModel,
};
use semantic::{Accelerator, BackendStatus, EmbeddingProvider, EmbeddingVector};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::classify::{Classification, ClassificationEngine};
use crate::entities::{EntityBundle, EntityExtractor};
use crate::metrics::{timed, PipelineMetrics, Stage, StageTimer};
use crate::normalize::{normalize, NormalizedReport};
use crate::summarize::Summarizer;
use crate::urgency::urgency_score;
use crate::{PipelineError, TriageConfig};

const DEFAULT_LANGUAGE: &str = "en";
const WARMUP_TEXT: &str = "Injured stray dog bleeding near the bus stand, needs help.";

/// Model capabilities the orchestrator drives.
#[derive(Clone)]
pub struct Capabilities {
    pub sentiment: Arc<dyn SentimentModel>,
    pub zero_shot: Arc<dyn ZeroShotModel>,
    pub summary: Arc<dyn SummaryModel>,
    pub tagger: Arc<dyn EntityTagger>,
}

impl Capabilities {
    /// All four capabilities served by one object.
    pub fn shared<M>(models: Arc<M>) -> Self
    where
        M: SentimentModel + ZeroShotModel + SummaryModel + EntityTagger + 'static,
    {
        Self {
            sentiment: models.clone(),
            zero_shot: models.clone(),
            summary: models.clone(),
            tagger: models,
        }
    }
}

/// Result of the analyze operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub category: String,
    pub confidence: f32,
    pub sentiment: SentimentLabel,
    pub urgency_score: f32,
    pub summary: String,
    pub entities: EntityBundle,
    /// Set when entity tagging was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

/// Result of the unified pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedAnalysis {
    pub language: String,
    /// Normalized input; no translation is performed.
    pub translated_text: String,
    /// `None` when no embedding backend produced a vector.
    pub embedding: Option<EmbeddingVector>,
    pub sentiment: SentimentResult,
    pub urgency_score: f32,
    /// Top categories in model order.
    pub classification: Vec<ScoredLabel>,
    pub entities: EntityBundle,
    pub summary: String,
    /// Every optional stage that degraded, as `"<stage>: <reason>"`.
    pub degraded: Vec<String>,
}

impl UnifiedAnalysis {
    pub fn dim(&self) -> usize {
        self.embedding.as_ref().map(|e| e.dim).unwrap_or(0)
    }

    pub fn model(&self) -> Option<&str> {
        self.embedding.as_ref().map(|e| e.backend_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentWarmup {
    pub name: &'static str,
    pub mandatory: bool,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmupReport {
    pub components: Vec<ComponentWarmup>,
    pub embeddings: Vec<BackendStatus>,
    pub accelerator: Accelerator,
}

impl WarmupReport {
    /// True when every mandatory component answered.
    pub fn mandatory_ready(&self) -> bool {
        self.components.iter().filter(|c| c.mandatory).all(|c| c.ready)
    }

    /// True when at least one embedding backend is loaded and healthy.
    pub fn embeddings_ready(&self) -> bool {
        self.embeddings
            .iter()
            .any(|b| b.loaded && b.last_error.is_none())
    }
}

/// Stages shared by analyze and the unified pipeline.
struct CoreStages {
    classification: Classification,
    urgency: f32,
    summary: String,
    entities: EntityBundle,
    entities_degraded: Option<String>,
}

/// Runs a field report through every stage.
///
/// Sentiment, zero-shot and summarization are mandatory: their failure fails
/// the request. Entity tagging and embeddings degrade.
pub struct PipelineOrchestrator {
    classifier: ClassificationEngine,
    summarizer: Summarizer,
    extractor: EntityExtractor,
    embeddings: Arc<EmbeddingProvider>,
    metrics: Option<Arc<dyn PipelineMetrics>>,
}

impl PipelineOrchestrator {
    pub fn new(capabilities: Capabilities, embeddings: Arc<EmbeddingProvider>) -> Self {
        Self {
            classifier: ClassificationEngine::new(capabilities.sentiment, capabilities.zero_shot),
            summarizer: Summarizer::new(capabilities.summary),
            extractor: EntityExtractor::new(capabilities.tagger),
            embeddings,
            metrics: None,
        }
    }

    /// Remote inference client for the model capabilities plus the configured
    /// embedding backends. Nothing is loaded or contacted here.
    pub fn from_config(cfg: &TriageConfig) -> Result<Self, PipelineError> {
        let client = HfInferenceClient::new(cfg.inference.clone())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let embeddings = EmbeddingProvider::from_config(&cfg.semantic)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        info!(
            sentiment = %cfg.inference.sentiment_model,
            zero_shot = %cfg.inference.zero_shot_model,
            summarizer = %cfg.inference.summarizer_model,
            ner = %cfg.inference.ner_model,
            "pipeline configured"
        );

        Self::new(Capabilities::shared(Arc::new(client)), Arc::new(embeddings))
            .with_summary_params(cfg.summary)
    }

    pub fn with_summary_params(mut self, params: SummaryParams) -> Result<Self, PipelineError> {
        self.summarizer = self.summarizer.with_params(params)?;
        Ok(self)
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingProvider> {
        &self.embeddings
    }

    /// Category, sentiment, urgency, summary and entities for one report.
    ///
    /// `language` is accepted for compatibility and not used.
    pub async fn analyze(
        &self,
        text: &str,
        language: Option<&str>,
    ) -> Result<AnalysisResult, PipelineError> {
        let report = normalize(text);
        debug!(chars = report.text.len(), language = ?language, "analyzing report");

        let core = self.run_core(&report).await?;
        Ok(AnalysisResult {
            category: core.classification.category,
            confidence: core.classification.confidence,
            sentiment: core.classification.sentiment.label,
            urgency_score: core.urgency,
            summary: core.summary,
            entities: core.entities,
            degraded: core.entities_degraded,
        })
    }

    /// Full analysis plus an embedding of the report.
    ///
    /// Blank text is rejected before any model is called. A missing embedding
    /// is reported as `None`, not as an error.
    pub async fn analyze_unified(
        &self,
        text: &str,
        language: Option<&str>,
    ) -> Result<UnifiedAnalysis, PipelineError> {
        let report = normalize(text);
        if report.is_empty() {
            return Err(PipelineError::Validation("text is required".into()));
        }

        let core = self.run_core(&report).await?;
        let mut degraded: Vec<String> = core.entities_degraded.into_iter().collect();

        let embedding = match self.embed_report(&report.text).await {
            Ok(vector) => Some(vector),
            Err(err) => {
                warn!(error = %err, "embedding unavailable; continuing without vector");
                degraded.push(format!("embedding: {err}"));
                None
            }
        };

        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        Ok(UnifiedAnalysis {
            language,
            translated_text: report.text,
            embedding,
            sentiment: core.classification.sentiment,
            urgency_score: core.urgency,
            classification: core.classification.top_categories,
            entities: core.entities,
            summary: core.summary,
            degraded,
        })
    }

    /// Embedding of `text` from the first healthy backend.
    pub async fn embed(&self, text: &str) -> Result<EmbeddingVector, PipelineError> {
        self.embed_report(text)
            .await
            .map_err(|e| PipelineError::ResourceUnavailable(e.to_string()))
    }

    async fn embed_report(&self, text: &str) -> Result<EmbeddingVector, semantic::SemanticError> {
        timed(self.metrics.as_ref(), Stage::Embed, self.embeddings.encode(text)).await
    }

    async fn run_core(&self, report: &NormalizedReport) -> Result<CoreStages, PipelineError> {
        let metrics = self.metrics.as_ref();

        let classification = timed(
            metrics,
            Stage::Classify,
            self.classifier.classify(&report.text),
        )
        .await?;
        let urgency = urgency_score(classification.sentiment.label, &report.lowered);

        let summary = timed(
            metrics,
            Stage::Summarize,
            self.summarizer.summarize(&report.text),
        )
        .await?;

        let timer = StageTimer::start(metrics, Stage::Entities);
        let outcome = self.extractor.extract(&report.text).await;
        timer.finish(!outcome.is_degraded());
        let entities_degraded = outcome.reason().map(str::to_string);

        Ok(CoreStages {
            classification,
            urgency,
            summary,
            entities: outcome.into_value(),
            entities_degraded,
        })
    }

    /// Exercises every capability once with a fixed sample.
    ///
    /// Never fails: mandatory components that do not answer are logged at
    /// error level, optional ones at warn level.
    pub async fn warm_up(&self) -> WarmupReport {
        let mut components = Vec::with_capacity(3);

        let classification = self.classifier.classify(WARMUP_TEXT).await;
        components.push(component("classification", true, classification.err()));

        let summary = self.summarizer.summarize(WARMUP_TEXT).await;
        components.push(component("summarizer", true, summary.err()));

        let entities = self.extractor.extract(WARMUP_TEXT).await;
        components.push(component("ner", false, entities.reason().map(str::to_string)));

        for c in &components {
            match (&c.error, c.mandatory) {
                (None, _) => info!(component = c.name, "component ready"),
                (Some(err), true) => error!(component = c.name, error = %err, "mandatory component failed warm-up"),
                (Some(err), false) => warn!(component = c.name, error = %err, "optional component failed warm-up"),
            }
        }

        let embeddings = self.embeddings.warm_up().await;
        if !embeddings.iter().any(|b| b.loaded && b.last_error.is_none()) {
            warn!("no embedding backend available after warm-up");
        }

        WarmupReport {
            components,
            embeddings,
            accelerator: self.embeddings.accelerator(),
        }
    }
}

fn component(
    name: &'static str,
    mandatory: bool,
    error: Option<impl ToString>,
) -> ComponentWarmup {
    ComponentWarmup {
        name,
        mandatory,
        ready: error.is_none(),
        error: error.map(|e| e.to_string()),
    }
}
