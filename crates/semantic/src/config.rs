use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::Accelerator;
use crate::SemanticError;

/// Which embedding backends to build and where their artifacts live.
///
/// # Example
/// ```no_run
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     secondary_model_dir: Some("./models/bge-small-en-v1.5".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Primary backend mode: `"onnx"` (local) or `"api"` (remote HTTP).
    pub mode: String,
    /// Label reported as the backend id of primary vectors.
    pub model_name: String,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Feature-extraction endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    pub api_timeout_secs: u64,
    pub secondary_model_name: String,
    /// Directory holding `model.onnx` (or `onnx/model.onnx`) and
    /// `tokenizer.json`. `None` leaves the secondary backend unconfigured.
    pub secondary_model_dir: Option<PathBuf>,
    /// Token budget per input; longer inputs are truncated.
    pub max_sequence_length: usize,
    /// Feed a zero `token_type_ids` tensor (BERT-family graphs need it).
    pub token_type_ids: bool,
    /// Accelerator flag. Only honoured when built with the `cuda` feature.
    pub use_gpu: bool,
    pub intra_threads: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            model_name: "all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx"),
            tokenizer_path: PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json"),
            api_url: None,
            api_auth_header: None,
            api_timeout_secs: 30,
            secondary_model_name: "bge-small-en-v1.5".into(),
            secondary_model_dir: None,
            max_sequence_length: 256,
            token_type_ids: true,
            use_gpu: false,
            intra_threads: 2,
        }
    }
}

impl SemanticConfig {
    pub fn validate(&self) -> Result<(), SemanticError> {
        match self.mode.as_str() {
            "onnx" => {}
            "api" => {
                if self.api_url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    return Err(SemanticError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ));
                }
            }
            other => {
                return Err(SemanticError::InvalidConfig(format!(
                    "unknown embedding mode '{other}' (expected onnx or api)"
                )))
            }
        }
        if self.model_name.trim().is_empty() {
            return Err(SemanticError::InvalidConfig("model_name must not be empty".into()));
        }
        if self.max_sequence_length == 0 {
            return Err(SemanticError::InvalidConfig(
                "max_sequence_length must be greater than zero".into(),
            ));
        }
        if self.intra_threads == 0 {
            return Err(SemanticError::InvalidConfig(
                "intra_threads must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The accelerator sessions will actually run on.
    pub fn accelerator(&self) -> Accelerator {
        if self.use_gpu && cfg!(feature = "cuda") {
            Accelerator::Cuda
        } else {
            Accelerator::Cpu
        }
    }
}
