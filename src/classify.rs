use inference::{ScoredLabel, SentimentModel, SentimentResult, ZeroShotModel};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::PipelineError;

/// Report categories, scored by the zero-shot model.
pub const CATEGORY_LABELS: [&str; 6] = [
    "bite incident",
    "injury case",
    "adoption request",
    "cruelty report",
    "health concern",
    "general sighting",
];

/// How many categories the unified pipeline reports.
pub const TOP_CATEGORIES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub sentiment: SentimentResult,
    /// Highest-ranked category.
    pub category: String,
    /// Score of `category`, clipped to `[0, 1]`.
    pub confidence: f32,
    /// Up to [`TOP_CATEGORIES`] labels in model order.
    pub top_categories: Vec<ScoredLabel>,
}

/// Sentiment plus single-label zero-shot categorization. Both capabilities
/// are mandatory: any failure aborts the request.
pub struct ClassificationEngine {
    sentiment: Arc<dyn SentimentModel>,
    zero_shot: Arc<dyn ZeroShotModel>,
}

impl ClassificationEngine {
    pub fn new(sentiment: Arc<dyn SentimentModel>, zero_shot: Arc<dyn ZeroShotModel>) -> Self {
        Self {
            sentiment,
            zero_shot,
        }
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, PipelineError> {
        let sentiment = self
            .sentiment
            .sentiment(text)
            .await
            .map_err(PipelineError::model("sentiment"))?;

        // Ties are left in the order the model returned them.
        let categories = self
            .zero_shot
            .classify(text, &CATEGORY_LABELS, false)
            .await
            .map_err(PipelineError::model("zero-shot"))?;

        let head = categories.head();
        debug!(
            sentiment = %sentiment.label,
            category = %head.label,
            confidence = head.score,
            "report classified"
        );

        Ok(Classification {
            sentiment,
            category: head.label.clone(),
            confidence: head.score.clamp(0.0, 1.0),
            top_categories: categories.top(TOP_CATEGORIES).to_vec(),
        })
    }
}
