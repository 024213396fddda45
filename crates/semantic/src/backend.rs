use async_trait::async_trait;
use inference::{HfInferenceClient, InferenceConfig};
use std::path::Path;
use std::sync::Arc;

use crate::assets::ModelAssets;
use crate::onnx::{OnnxEncoder, Pooling, SessionOptions};
use crate::{SemanticConfig, SemanticError};

/// Something that turns texts into raw vectors.
///
/// Implementations return one vector per input in input order. They do not
/// need to normalize; [`EmbeddingProvider`](crate::EmbeddingProvider) does.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn model_name(&self) -> &str;

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError>;
}

/// Local ONNX model.
#[derive(Debug)]
pub struct OnnxBackend {
    model_name: String,
    encoder: Arc<OnnxEncoder>,
}

impl OnnxBackend {
    /// Primary sentence-embedding model from the explicit model/tokenizer paths.
    pub fn sentence(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let assets = ModelAssets::from_paths(&cfg.model_path, &cfg.tokenizer_path)?;
        let encoder = OnnxEncoder::load(&assets, session_options(cfg), Pooling::SentenceOutput)?;
        Ok(Self {
            model_name: cfg.model_name.clone(),
            encoder: Arc::new(encoder),
        })
    }

    /// Plain transformer encoder from `dir`, mean-pooled under the attention mask.
    pub fn mean_pooled(
        model_name: &str,
        dir: &Path,
        cfg: &SemanticConfig,
    ) -> Result<Self, SemanticError> {
        let assets = ModelAssets::from_dir(dir)?;
        let encoder = OnnxEncoder::load(&assets, session_options(cfg), Pooling::MaskedMean)?;
        Ok(Self {
            model_name: model_name.to_string(),
            encoder: Arc::new(encoder),
        })
    }
}

fn session_options(cfg: &SemanticConfig) -> SessionOptions {
    SessionOptions {
        intra_threads: cfg.intra_threads,
        use_gpu: cfg.use_gpu,
        max_sequence_length: cfg.max_sequence_length,
        token_type_ids: cfg.token_type_ids,
    }
}

#[async_trait]
impl EmbeddingBackend for OnnxBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Tokenization and `Session::run` happen on the blocking pool.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let encoder = Arc::clone(&self.encoder);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        run_blocking(move || {
            let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
            encoder.encode(&refs)
        })
        .await
    }
}

/// Remote feature-extraction endpoint.
#[derive(Debug, Clone)]
pub struct ApiBackend {
    model_name: String,
    url: String,
    client: HfInferenceClient,
}

impl ApiBackend {
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;
        let client = HfInferenceClient::new(InferenceConfig {
            api_auth_header: cfg.api_auth_header.clone(),
            timeout_secs: cfg.api_timeout_secs.max(1),
            ..InferenceConfig::default()
        })?;
        Ok(Self {
            model_name: cfg.model_name.clone(),
            url,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingBackend for ApiBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(self.client.feature_extraction(&self.url, texts).await?)
    }
}

/// Moves CPU-bound model work off the async worker threads.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, SemanticError>
where
    F: FnOnce() -> Result<T, SemanticError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SemanticError::Inference(format!("blocking task failed: {e}")))?
}

/// Builds the primary backend selected by `cfg.mode`.
pub(crate) fn build_primary(cfg: &SemanticConfig) -> Result<Arc<dyn EmbeddingBackend>, SemanticError> {
    match cfg.mode.as_str() {
        "api" => Ok(Arc::new(ApiBackend::new(cfg)?)),
        _ => Ok(Arc::new(OnnxBackend::sentence(cfg)?)),
    }
}
