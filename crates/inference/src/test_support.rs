//! Canned capability implementations for tests and demos.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::capability::{EntityTagger, SentimentModel, SummaryModel, ZeroShotModel};
use crate::types::{
    CategoryResult, NerSpan, ScoredLabel, SentimentLabel, SentimentResult, SummaryParams,
};
use crate::InferenceError;

/// One object implementing every capability with fixed answers.
#[derive(Debug)]
pub struct FakeModels {
    pub sentiment: Result<SentimentResult, InferenceError>,
    pub categories: Result<Vec<ScoredLabel>, InferenceError>,
    pub summary: Result<String, InferenceError>,
    pub spans: Result<Vec<NerSpan>, InferenceError>,
    calls: AtomicUsize,
}

impl Default for FakeModels {
    fn default() -> Self {
        Self {
            sentiment: Ok(SentimentResult {
                label: SentimentLabel::Negative,
                score: 0.97,
            }),
            categories: Ok(vec![
                ScoredLabel::new("injury case", 0.71),
                ScoredLabel::new("bite incident", 0.12),
                ScoredLabel::new("health concern", 0.08),
                ScoredLabel::new("general sighting", 0.05),
                ScoredLabel::new("cruelty report", 0.03),
                ScoredLabel::new("adoption request", 0.01),
            ]),
            summary: Ok("Injured dog reported.".into()),
            spans: Ok(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeModels {
    pub fn with_sentiment(mut self, label: SentimentLabel, score: f32) -> Self {
        self.sentiment = Ok(SentimentResult { label, score });
        self
    }

    pub fn with_categories(mut self, labels: Vec<ScoredLabel>) -> Self {
        self.categories = Ok(labels);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Ok(summary.into());
        self
    }

    pub fn with_spans(mut self, spans: Vec<NerSpan>) -> Self {
        self.spans = Ok(spans);
        self
    }

    pub fn failing_sentiment(mut self) -> Self {
        self.sentiment = Err(unavailable("sentiment"));
        self
    }

    pub fn failing_zero_shot(mut self) -> Self {
        self.categories = Err(unavailable("zero-shot"));
        self
    }

    pub fn failing_summary(mut self) -> Self {
        self.summary = Err(unavailable("summarizer"));
        self
    }

    pub fn failing_tagger(mut self) -> Self {
        self.spans = Err(unavailable("ner"));
        self
    }

    /// Total capability invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn unavailable(what: &str) -> InferenceError {
    InferenceError::Status {
        status: 503,
        body: format!("{what} model is loading"),
    }
}

#[async_trait]
impl SentimentModel for FakeModels {
    async fn sentiment(&self, _text: &str) -> Result<SentimentResult, InferenceError> {
        self.hit();
        self.sentiment.clone()
    }
}

#[async_trait]
impl ZeroShotModel for FakeModels {
    async fn classify(
        &self,
        _text: &str,
        _candidate_labels: &[&str],
        _multi_label: bool,
    ) -> Result<CategoryResult, InferenceError> {
        self.hit();
        CategoryResult::new(self.categories.clone()?)
    }
}

#[async_trait]
impl SummaryModel for FakeModels {
    async fn summarize(&self, _text: &str, _params: &SummaryParams) -> Result<String, InferenceError> {
        self.hit();
        self.summary.clone()
    }
}

#[async_trait]
impl EntityTagger for FakeModels {
    async fn tag(&self, _text: &str) -> Result<Vec<NerSpan>, InferenceError> {
        self.hit();
        self.spans.clone()
    }
}
