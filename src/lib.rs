//! Triage for stray-dog field reports.
//!
//! A report is classified (sentiment plus one of six categories), scored for
//! urgency, summarized, and mined for locations and symptoms. The unified
//! pipeline also embeds the report so it can be compared against earlier
//! ones for duplicates.
//!
//! ```no_run
//! use triage::{PipelineOrchestrator, TriageConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = TriageConfig::load(None)?;
//! let pipeline = PipelineOrchestrator::from_config(&cfg)?;
//! let analysis = pipeline
//!     .analyze_unified("Dog bleeding near the Chennai bus stand", None)
//!     .await?;
//! println!("{} ({:.2})", analysis.summary, analysis.urgency_score);
//! # Ok(())
//! # }
//! ```

mod classify;
mod config;
mod entities;
mod error;
mod metrics;
mod normalize;
mod pipeline;
mod summarize;
mod urgency;

pub use classify::{CATEGORY_LABELS, Classification, ClassificationEngine, TOP_CATEGORIES};
pub use config::{ConfigLoadError, DuplicateYamlConfig, TriageConfig};
pub use entities::{
    EntityBundle, EntityExtractor, SYMPTOM_STEMS, collect_locations, extract_symptoms,
};
pub use error::PipelineError;
pub use metrics::{PipelineMetrics, Stage};
pub use normalize::{NormalizedReport, normalize};
pub use pipeline::{
    AnalysisResult, Capabilities, ComponentWarmup, PipelineOrchestrator, UnifiedAnalysis,
    WarmupReport,
};
pub use summarize::Summarizer;
pub use urgency::{URGENCY_KEYWORDS, has_urgency_keyword, urgency_score};

pub use inference::{
    CategoryResult, EntityTagger, HfInferenceClient, InferenceConfig, InferenceError, NerSpan,
    Outcome, ScoredLabel, SentimentLabel, SentimentModel, SentimentResult, SummaryModel,
    SummaryParams, ZeroShotModel,
};
pub use matcher::{
    DEFAULT_THRESHOLD, DuplicateDetector, DuplicateMatch, DuplicateResult, MatchMetrics,
    rank_matches,
};
pub use semantic::{
    Accelerator, BackendKind, BackendStatus, EmbeddingBackend, EmbeddingProvider,
    EmbeddingVector, LazyBackend, SemanticConfig, SemanticError, cosine_similarity,
};
