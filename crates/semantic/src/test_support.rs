//! In-memory embedding backends for tests and demos.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::EmbeddingBackend;
use crate::SemanticError;

/// Returns canned vectors: a per-text table first, then a fallback vector.
#[derive(Debug, Default)]
pub struct StaticBackend {
    model_name: String,
    table: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
    refused: Vec<String>,
    calls: AtomicUsize,
}

impl StaticBackend {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            ..Default::default()
        }
    }

    /// Same vector for every input.
    pub fn uniform(model_name: &str, vector: Vec<f32>) -> Self {
        Self {
            fallback: Some(vector),
            ..Self::new(model_name)
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    /// Fails any batch that contains `text`.
    pub fn refusing(mut self, text: &str) -> Self {
        self.refused.push(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingBackend for StaticBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|text| {
                if self.refused.iter().any(|r| r == text) {
                    return Err(SemanticError::Inference(format!("refused '{text}'")));
                }
                self.table
                    .get(*text)
                    .or(self.fallback.as_ref())
                    .cloned()
                    .ok_or_else(|| SemanticError::Inference(format!("no vector for '{text}'")))
            })
            .collect()
    }
}

/// Always errors.
#[derive(Debug)]
pub struct FailingBackend {
    model_name: String,
    calls: AtomicUsize,
}

impl FailingBackend {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingBackend for FailingBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SemanticError::Inference(format!(
            "{} backend is offline",
            self.model_name
        )))
    }
}
