//! HTTP client for Hugging Face style inference endpoints.
//!
//! One pooled `reqwest::Client` is shared by all four capabilities plus the
//! feature-extraction call used by remote embedding backends. Requests are
//! sent once; there is no retry layer here.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::capability::{EntityTagger, SentimentModel, SummaryModel, ZeroShotModel};
use crate::types::{
    CategoryResult, NerSpan, ScoredLabel, SentimentLabel, SentimentResult, SummaryParams,
};
use crate::{InferenceConfig, InferenceError};

#[derive(Debug, Clone)]
pub struct HfInferenceClient {
    http: reqwest::Client,
    cfg: InferenceConfig,
}

impl HfInferenceClient {
    pub fn new(cfg: InferenceConfig) -> Result<Self, InferenceError> {
        cfg.validate().map_err(InferenceError::InvalidConfig)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| InferenceError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.cfg
    }

    /// POSTs `payload` to `url` and returns the decoded JSON body.
    pub async fn post_json(&self, url: &str, payload: &Value) -> Result<Value, InferenceError> {
        let started = Instant::now();
        let mut request = self.http.post(url).header("Content-Type", "application/json");
        if let Some(header) = self.cfg.api_auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| InferenceError::decode(format!("invalid JSON response: {e}")))?;
        debug!(
            url,
            latency_ms = started.elapsed().as_millis() as u64,
            "inference call completed"
        );
        Ok(value)
    }

    async fn call_model(&self, model: &str, payload: Value) -> Result<Value, InferenceError> {
        let url = self.cfg.model_url(model);
        self.post_json(&url, &payload).await
    }

    /// Feature-extraction call returning one raw (unnormalized) vector per input.
    pub async fn feature_extraction(
        &self,
        url: &str,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>, InferenceError> {
        let payload = json!({ "inputs": texts });
        let response = self.post_json(url, &payload).await?;
        let vectors = parse_embeddings(response)?;
        if vectors.len() != texts.len() {
            return Err(InferenceError::decode(format!(
                "endpoint returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl SentimentModel for HfInferenceClient {
    async fn sentiment(&self, text: &str) -> Result<SentimentResult, InferenceError> {
        let response = self
            .call_model(&self.cfg.sentiment_model, json!({ "inputs": text }))
            .await?;
        parse_sentiment(response)
    }
}

#[async_trait]
impl ZeroShotModel for HfInferenceClient {
    async fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
        multi_label: bool,
    ) -> Result<CategoryResult, InferenceError> {
        let payload = json!({
            "inputs": text,
            "parameters": {
                "candidate_labels": candidate_labels,
                "multi_label": multi_label,
            }
        });
        let response = self.call_model(&self.cfg.zero_shot_model, payload).await?;
        parse_zero_shot(response)
    }
}

#[async_trait]
impl SummaryModel for HfInferenceClient {
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, InferenceError> {
        let payload = json!({
            "inputs": text,
            "parameters": {
                "min_length": params.min_length,
                "max_length": params.max_length,
                "do_sample": params.do_sample,
            }
        });
        let response = self.call_model(&self.cfg.summarizer_model, payload).await?;
        parse_summary(response)
    }
}

#[async_trait]
impl EntityTagger for HfInferenceClient {
    async fn tag(&self, text: &str) -> Result<Vec<NerSpan>, InferenceError> {
        let payload = json!({
            "inputs": text,
            "parameters": { "aggregation_strategy": "simple" }
        });
        let response = self.call_model(&self.cfg.ner_model, payload).await?;
        parse_spans(response)
    }
}

/// Text-classification pipelines answer `[{label, score}, ..]`, sometimes
/// wrapped in an extra array. The highest score wins; ties keep the first.
fn parse_sentiment(value: Value) -> Result<SentimentResult, InferenceError> {
    let items = match value {
        Value::Array(mut outer) if matches!(outer.first(), Some(Value::Array(_))) => {
            match outer.swap_remove(0) {
                Value::Array(inner) => inner,
                _ => Vec::new(),
            }
        }
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(InferenceError::decode(format!(
                "sentiment response must be an array, got {other}"
            )))
        }
    };

    let mut best: Option<ScoredLabel> = None;
    for item in items {
        let scored: ScoredLabel = serde_json::from_value(item)
            .map_err(|e| InferenceError::decode(format!("sentiment entry: {e}")))?;
        if best.as_ref().is_none_or(|b| scored.score > b.score) {
            best = Some(scored);
        }
    }

    let best = best.ok_or_else(|| InferenceError::decode("sentiment response was empty"))?;
    Ok(SentimentResult {
        label: best.label.parse::<SentimentLabel>()?,
        score: best.score,
    })
}

/// Accepts `{labels, scores}` (optionally wrapped in a one-element array) or a
/// flat `[{label, score}]` list. Order is preserved.
fn parse_zero_shot(value: Value) -> Result<CategoryResult, InferenceError> {
    let value = match value {
        Value::Array(mut items)
            if items.len() == 1 && matches!(items.first(), Some(Value::Object(o)) if o.contains_key("labels")) =>
        {
            items.swap_remove(0)
        }
        other => other,
    };

    match value {
        Value::Object(mut map) => {
            let labels: Vec<String> = map
                .remove("labels")
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| InferenceError::decode(format!("zero-shot labels: {e}")))?
                .ok_or_else(|| InferenceError::decode("zero-shot response missing `labels`"))?;
            let scores: Vec<f32> = map
                .remove("scores")
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| InferenceError::decode(format!("zero-shot scores: {e}")))?
                .ok_or_else(|| InferenceError::decode("zero-shot response missing `scores`"))?;
            if labels.len() != scores.len() {
                return Err(InferenceError::decode(format!(
                    "zero-shot returned {} labels but {} scores",
                    labels.len(),
                    scores.len()
                )));
            }
            CategoryResult::new(
                labels
                    .into_iter()
                    .zip(scores)
                    .map(|(label, score)| ScoredLabel { label, score })
                    .collect(),
            )
        }
        Value::Array(items) => {
            let labels: Vec<ScoredLabel> = serde_json::from_value(Value::Array(items))
                .map_err(|e| InferenceError::decode(format!("zero-shot entries: {e}")))?;
            CategoryResult::new(labels)
        }
        other => Err(InferenceError::decode(format!(
            "unsupported zero-shot response shape: {other}"
        ))),
    }
}

fn parse_summary(value: Value) -> Result<String, InferenceError> {
    let obj = match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };
    match obj {
        Value::Object(mut map) => match map
            .remove("summary_text")
            .or_else(|| map.remove("generated_text"))
        {
            Some(Value::String(text)) => Ok(text.trim().to_string()),
            _ => Err(InferenceError::decode("summary response missing `summary_text`")),
        },
        other => Err(InferenceError::decode(format!(
            "unsupported summary response shape: {other}"
        ))),
    }
}

fn parse_spans(value: Value) -> Result<Vec<NerSpan>, InferenceError> {
    serde_json::from_value(value).map_err(|e| InferenceError::decode(format!("ner spans: {e}")))
}

fn parse_embeddings(value: Value) -> Result<Vec<Vec<f32>>, InferenceError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                InferenceError::decode("missing `embedding` field in data item")
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(InferenceError::decode("unexpected entry inside `data` array")),
                    })
                    .collect();
            }

            Err(InferenceError::decode("unsupported embedding response shape"))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, InferenceError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, InferenceError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| InferenceError::decode("non-finite embedding value")),
                other => Err(InferenceError::decode(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(InferenceError::decode(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}
