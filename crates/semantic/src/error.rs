use inference::InferenceError;
use std::io;
use thiserror::Error;

/// Errors raised while building or running an embedding backend.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model file is not where the config says it is.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// `tokenizer.json` is missing or unreadable.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or output-shape failures.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The remote feature-extraction endpoint failed.
    #[error("remote embedding failure: {0}")]
    Remote(#[from] InferenceError),
    #[error("nothing to encode")]
    EmptyInput,
    /// Every configured backend failed for this call.
    #[error("no embedding backend available: {0}")]
    Unavailable(String),
}
