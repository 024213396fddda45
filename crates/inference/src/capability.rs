use async_trait::async_trait;

use crate::types::{CategoryResult, NerSpan, SentimentResult, SummaryParams};
use crate::InferenceError;

/// Binary sentiment over free text.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    async fn sentiment(&self, text: &str) -> Result<SentimentResult, InferenceError>;
}

/// Natural-language-inference scoring of `text` against arbitrary labels.
///
/// Implementations must return labels in the model's ranking order and must
/// not reorder ties.
#[async_trait]
pub trait ZeroShotModel: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
        multi_label: bool,
    ) -> Result<CategoryResult, InferenceError>;
}

#[async_trait]
pub trait SummaryModel: Send + Sync {
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, InferenceError>;
}

/// Named-entity recognition with sub-word pieces aggregated into spans.
#[async_trait]
pub trait EntityTagger: Send + Sync {
    async fn tag(&self, text: &str) -> Result<Vec<NerSpan>, InferenceError>;
}
