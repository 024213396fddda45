use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::InferenceError;

/// Binary polarity reported by the sentiment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = InferenceError;

    /// Case-insensitive; anything other than positive/negative is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            other => Err(InferenceError::decode(format!(
                "unknown sentiment label '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f32,
}

/// A label with its model score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f32,
}

impl ScoredLabel {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Zero-shot output. Order is exactly what the model returned; index 0 is the
/// winning label. Construction guarantees at least one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    labels: Vec<ScoredLabel>,
}

impl CategoryResult {
    pub fn new(labels: Vec<ScoredLabel>) -> Result<Self, InferenceError> {
        if labels.is_empty() {
            return Err(InferenceError::decode("zero-shot result contained no labels"));
        }
        Ok(Self { labels })
    }

    pub fn head(&self) -> &ScoredLabel {
        &self.labels[0]
    }

    pub fn top(&self, k: usize) -> &[ScoredLabel] {
        &self.labels[..k.min(self.labels.len())]
    }

    pub fn labels(&self) -> &[ScoredLabel] {
        &self.labels
    }
}

/// One aggregated named-entity span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NerSpan {
    /// `LOC`, `PER`, `ORG`, `MISC`. Non-aggregated responses call it `entity`.
    #[serde(alias = "entity")]
    pub entity_group: String,
    pub word: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

impl NerSpan {
    pub fn new(entity_group: impl Into<String>, word: impl Into<String>, score: f32) -> Self {
        Self {
            entity_group: entity_group.into(),
            word: word.into(),
            score,
            start: None,
            end: None,
        }
    }
}

/// Length bounds, in tokens, for abstractive summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryParams {
    pub min_length: u32,
    pub max_length: u32,
    pub do_sample: bool,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            min_length: 12,
            max_length: 60,
            do_sample: false,
        }
    }
}

impl SummaryParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_length == 0 {
            return Err("summary max_length must be greater than zero".into());
        }
        if self.min_length > self.max_length {
            return Err(format!(
                "summary min_length ({}) exceeds max_length ({})",
                self.min_length, self.max_length
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_label_parses_model_casing() {
        assert_eq!(
            "NEGATIVE".parse::<SentimentLabel>().unwrap(),
            SentimentLabel::Negative
        );
        assert_eq!(
            " Positive ".parse::<SentimentLabel>().unwrap(),
            SentimentLabel::Positive
        );
        assert!("LABEL_1".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn sentiment_label_serializes_lowercase() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
    }

    #[test]
    fn category_result_keeps_model_order() {
        let result = CategoryResult::new(vec![
            ScoredLabel::new("injury case", 0.4),
            ScoredLabel::new("bite incident", 0.4),
            ScoredLabel::new("general sighting", 0.2),
            ScoredLabel::new("health concern", 0.0),
        ])
        .unwrap();
        assert_eq!(result.head().label, "injury case");
        let top: Vec<_> = result.top(3).iter().map(|l| l.label.as_str()).collect();
        assert_eq!(top, ["injury case", "bite incident", "general sighting"]);
        assert_eq!(result.top(10).len(), 4);
    }

    #[test]
    fn category_result_requires_a_label() {
        assert!(CategoryResult::new(Vec::new()).is_err());
    }

    #[test]
    fn ner_span_accepts_non_aggregated_key() {
        let span: NerSpan =
            serde_json::from_str(r#"{"entity":"LOC","word":"Chennai","score":0.99}"#).unwrap();
        assert_eq!(span.entity_group, "LOC");
        assert!(span.start.is_none());
    }

    #[test]
    fn summary_params_validate_bounds() {
        assert!(SummaryParams::default().validate().is_ok());
        let bad = SummaryParams {
            min_length: 80,
            max_length: 60,
            do_sample: false,
        };
        assert!(bad.validate().is_err());
    }
}
