use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a backend in the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Primary,
    Secondary,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Primary => "primary",
            BackendKind::Secondary => "secondary",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    Cpu,
    Cuda,
}

impl Accelerator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accelerator::Cpu => "cpu",
            Accelerator::Cuda => "cuda",
        }
    }
}

/// A unit-length embedding and the backend that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub values: Vec<f32>,
    pub dim: usize,
    /// Model name of the producing backend.
    pub backend_id: String,
    pub backend: BackendKind,
}

/// Vectors from one dispatch. All of them come from the same backend.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    pub backend: BackendKind,
    pub model_name: String,
    pub vectors: Vec<EmbeddingVector>,
}

/// Snapshot of one backend for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub backend: BackendKind,
    pub model_name: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
