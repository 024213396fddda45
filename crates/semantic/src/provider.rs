use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::backend::{build_primary, run_blocking, EmbeddingBackend, OnnxBackend};
use crate::normalize::{is_unit_norm, l2_normalize_in_place};
use crate::types::{Accelerator, BackendKind, BackendStatus, EmbeddingBatch, EmbeddingVector};
use crate::{SemanticConfig, SemanticError};

type Loader = Box<dyn Fn() -> Result<Arc<dyn EmbeddingBackend>, SemanticError> + Send + Sync>;

const WARMUP_TEXT: &str = "warm-up: stray dog seen near the market";

/// A backend that is constructed on first use and then kept.
///
/// Construction runs at most once at a time; concurrent first callers wait for
/// the same result. A failed construction is not cached, so the next call
/// tries again. Construction runs on the blocking pool.
pub struct LazyBackend {
    kind: BackendKind,
    model_name: String,
    slot: Arc<Slot>,
    last_error: RwLock<Option<String>>,
}

struct Slot {
    loader: Loader,
    cell: OnceCell<Arc<dyn EmbeddingBackend>>,
}

impl fmt::Debug for LazyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyBackend")
            .field("kind", &self.kind)
            .field("model_name", &self.model_name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl LazyBackend {
    pub fn new<F>(kind: BackendKind, model_name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn EmbeddingBackend>, SemanticError> + Send + Sync + 'static,
    {
        Self {
            kind,
            model_name: model_name.into(),
            slot: Arc::new(Slot {
                loader: Box::new(loader),
                cell: OnceCell::new(),
            }),
            last_error: RwLock::new(None),
        }
    }

    /// Wraps an already-built backend.
    pub fn ready(kind: BackendKind, backend: Arc<dyn EmbeddingBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        let cell = OnceCell::new();
        let _ = cell.set(Arc::clone(&backend));
        Self {
            kind,
            model_name,
            slot: Arc::new(Slot {
                loader: Box::new(move || Ok(Arc::clone(&backend))),
                cell,
            }),
            last_error: RwLock::new(None),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.cell.get().is_some()
    }

    pub async fn get(&self) -> Result<Arc<dyn EmbeddingBackend>, SemanticError> {
        if let Some(backend) = self.slot.cell.get() {
            return Ok(Arc::clone(backend));
        }
        let slot = Arc::clone(&self.slot);
        let kind = self.kind;
        let model_name = self.model_name.clone();
        run_blocking(move || {
            slot.cell
                .get_or_try_init(|| {
                    debug!(backend = %kind, model = %model_name, "constructing embedding backend");
                    (slot.loader)()
                })
                .cloned()
        })
        .await
    }

    fn record_error(&self, err: Option<String>) {
        if let Ok(mut slot) = self.last_error.write() {
            *slot = err;
        }
    }

    pub fn status(&self) -> BackendStatus {
        BackendStatus {
            backend: self.kind,
            model_name: self.model_name.clone(),
            loaded: self.is_loaded(),
            last_error: self.last_error.read().ok().and_then(|e| e.clone()),
        }
    }
}

/// Ordered list of embedding backends with a single dispatch routine.
#[derive(Debug)]
pub struct EmbeddingProvider {
    backends: Vec<LazyBackend>,
    accelerator: Accelerator,
}

impl EmbeddingProvider {
    pub fn new(backends: Vec<LazyBackend>) -> Self {
        Self {
            backends,
            accelerator: Accelerator::Cpu,
        }
    }

    pub fn with_accelerator(mut self, accelerator: Accelerator) -> Self {
        self.accelerator = accelerator;
        self
    }

    /// Primary first, then the secondary backend when a model directory is
    /// configured. Nothing is loaded until the first encode call.
    pub fn from_config(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let mut backends = Vec::with_capacity(2);

        let primary_cfg = cfg.clone();
        backends.push(LazyBackend::new(
            BackendKind::Primary,
            cfg.model_name.clone(),
            move || build_primary(&primary_cfg),
        ));

        if let Some(dir) = cfg.secondary_model_dir.clone() {
            let secondary_cfg = cfg.clone();
            let name = cfg.secondary_model_name.clone();
            backends.push(LazyBackend::new(
                BackendKind::Secondary,
                name.clone(),
                move || {
                    let backend = OnnxBackend::mean_pooled(&name, &dir, &secondary_cfg)?;
                    Ok(Arc::new(backend) as Arc<dyn EmbeddingBackend>)
                },
            ));
        }

        info!(
            backends = backends.len(),
            primary_mode = %cfg.mode,
            accelerator = cfg.accelerator().as_str(),
            "embedding provider configured"
        );
        Ok(Self::new(backends).with_accelerator(cfg.accelerator()))
    }

    pub fn accelerator(&self) -> Accelerator {
        self.accelerator
    }

    pub fn backends(&self) -> &[LazyBackend] {
        &self.backends
    }

    /// Encodes every text with the first backend that can handle all of them.
    ///
    /// A backend that fails to build, errors, or returns a malformed batch is
    /// skipped and the whole batch moves to the next one, so the returned
    /// vectors never mix backends.
    pub async fn encode_batch(&self, texts: &[&str]) -> Result<EmbeddingBatch, SemanticError> {
        if texts.is_empty() {
            return Err(SemanticError::EmptyInput);
        }

        let mut failures = Vec::new();
        for lazy in &self.backends {
            match self.try_backend(lazy, texts).await {
                Ok(batch) => {
                    lazy.record_error(None);
                    return Ok(batch);
                }
                Err(err) => {
                    warn!(
                        backend = %lazy.kind(),
                        model = %lazy.model_name(),
                        error = %err,
                        "embedding backend failed; trying next"
                    );
                    lazy.record_error(Some(err.to_string()));
                    failures.push(format!("{}: {err}", lazy.kind()));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no backends configured".into());
        }
        Err(SemanticError::Unavailable(failures.join("; ")))
    }

    pub async fn encode(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        let batch = self.encode_batch(&[text]).await?;
        batch
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| SemanticError::Inference("backend returned no vector".into()))
    }

    async fn try_backend(
        &self,
        lazy: &LazyBackend,
        texts: &[&str],
    ) -> Result<EmbeddingBatch, SemanticError> {
        let backend = lazy.get().await?;
        let raw = backend.embed(texts).await?;
        let vectors = finalize_vectors(raw, texts.len(), lazy.kind(), backend.model_name())?;
        Ok(EmbeddingBatch {
            backend: lazy.kind(),
            model_name: backend.model_name().to_string(),
            vectors,
        })
    }

    /// Builds and exercises every backend once. Failures are logged, never returned.
    pub async fn warm_up(&self) -> Vec<BackendStatus> {
        let mut statuses = Vec::with_capacity(self.backends.len());
        for lazy in &self.backends {
            match self.try_backend(lazy, &[WARMUP_TEXT]).await {
                Ok(batch) => {
                    lazy.record_error(None);
                    info!(
                        backend = %lazy.kind(),
                        model = %batch.model_name,
                        dim = batch.vectors.first().map(|v| v.dim).unwrap_or(0),
                        "embedding backend warmed up"
                    );
                }
                Err(err) => {
                    warn!(backend = %lazy.kind(), error = %err, "embedding backend warm-up failed");
                    lazy.record_error(Some(err.to_string()));
                }
            }
            statuses.push(lazy.status());
        }
        statuses
    }

    pub fn status(&self) -> Vec<BackendStatus> {
        self.backends.iter().map(LazyBackend::status).collect()
    }
}

/// Checks shape, normalizes, and wraps raw backend output.
fn finalize_vectors(
    raw: Vec<Vec<f32>>,
    expected: usize,
    kind: BackendKind,
    model_name: &str,
) -> Result<Vec<EmbeddingVector>, SemanticError> {
    if raw.len() != expected {
        return Err(SemanticError::Inference(format!(
            "backend returned {} vectors for {expected} inputs",
            raw.len()
        )));
    }
    let dim = raw.first().map(Vec::len).unwrap_or(0);
    if dim == 0 {
        return Err(SemanticError::Inference("backend returned empty vectors".into()));
    }

    raw.into_iter()
        .map(|mut values| {
            if values.len() != dim {
                return Err(SemanticError::Inference(format!(
                    "inconsistent embedding dimensions: {} vs {dim}",
                    values.len()
                )));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(SemanticError::Inference("non-finite embedding value".into()));
            }
            l2_normalize_in_place(&mut values);
            if !is_unit_norm(&values) {
                return Err(SemanticError::Inference("zero-norm embedding".into()));
            }
            Ok(EmbeddingVector {
                values,
                dim,
                backend_id: model_name.to_string(),
                backend: kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingBackend, StaticBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ready(kind: BackendKind, backend: impl EmbeddingBackend + 'static) -> LazyBackend {
        LazyBackend::ready(kind, Arc::new(backend))
    }

    #[tokio::test]
    async fn primary_wins_when_healthy() {
        let provider = EmbeddingProvider::new(vec![
            ready(BackendKind::Primary, StaticBackend::uniform("minilm", vec![3.0, 4.0])),
            ready(BackendKind::Secondary, StaticBackend::uniform("bge", vec![1.0, 0.0])),
        ]);
        let v = provider.encode("dog").await.unwrap();
        assert_eq!(v.backend, BackendKind::Primary);
        assert_eq!(v.backend_id, "minilm");
        assert_eq!(v.dim, 2);
        assert!((v.values[0] - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn falls_back_to_secondary() {
        let provider = EmbeddingProvider::new(vec![
            ready(BackendKind::Primary, FailingBackend::new("minilm")),
            ready(BackendKind::Secondary, StaticBackend::uniform("bge", vec![0.0, 2.0])),
        ]);
        let v = provider.encode("dog").await.unwrap();
        assert_eq!(v.backend, BackendKind::Secondary);
        assert_eq!(v.values, vec![0.0, 1.0]);
        let status = provider.status();
        assert!(status[0].last_error.is_some());
        assert!(status[1].last_error.is_none());
    }

    #[tokio::test]
    async fn batch_moves_wholesale_when_one_text_fails() {
        let primary = StaticBackend::uniform("minilm", vec![1.0, 0.0]).refusing("candidate b");
        let provider = EmbeddingProvider::new(vec![
            ready(BackendKind::Primary, primary),
            ready(BackendKind::Secondary, StaticBackend::uniform("bge", vec![0.0, 1.0])),
        ]);
        let batch = provider
            .encode_batch(&["query", "candidate a", "candidate b"])
            .await
            .unwrap();
        assert_eq!(batch.backend, BackendKind::Secondary);
        assert!(batch.vectors.iter().all(|v| v.backend == BackendKind::Secondary));
        assert_eq!(batch.vectors.len(), 3);
    }

    #[tokio::test]
    async fn all_failing_is_unavailable() {
        let provider = EmbeddingProvider::new(vec![
            ready(BackendKind::Primary, FailingBackend::new("minilm")),
            ready(BackendKind::Secondary, FailingBackend::new("bge")),
        ]);
        let err = provider.encode("dog").await.unwrap_err();
        match err {
            SemanticError::Unavailable(msg) => {
                assert!(msg.contains("primary"));
                assert!(msg.contains("secondary"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_provider_is_unavailable() {
        let provider = EmbeddingProvider::new(Vec::new());
        assert!(matches!(
            provider.encode("dog").await,
            Err(SemanticError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let provider = EmbeddingProvider::new(vec![ready(
            BackendKind::Primary,
            StaticBackend::uniform("minilm", vec![1.0]),
        )]);
        assert!(matches!(
            provider.encode_batch(&[]).await,
            Err(SemanticError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn zero_vectors_trigger_fallback() {
        let provider = EmbeddingProvider::new(vec![
            ready(BackendKind::Primary, StaticBackend::uniform("minilm", vec![0.0, 0.0])),
            ready(BackendKind::Secondary, StaticBackend::uniform("bge", vec![1.0, 1.0])),
        ]);
        let v = provider.encode("dog").await.unwrap();
        assert_eq!(v.backend, BackendKind::Secondary);
    }

    #[tokio::test]
    async fn lazy_backend_constructs_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let lazy = LazyBackend::new(BackendKind::Primary, "minilm", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StaticBackend::uniform("minilm", vec![1.0, 0.0])) as Arc<dyn EmbeddingBackend>)
        });
        let provider = EmbeddingProvider::new(vec![lazy]);
        assert!(!provider.backends()[0].is_loaded());

        for _ in 0..3 {
            provider.encode("dog").await.unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(provider.backends()[0].is_loaded());
    }

    #[tokio::test]
    async fn failed_construction_is_retried_later() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let lazy = LazyBackend::new(BackendKind::Primary, "minilm", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SemanticError::ModelNotFound("model.onnx".into()))
            } else {
                Ok(Arc::new(StaticBackend::uniform("minilm", vec![1.0])) as Arc<dyn EmbeddingBackend>)
            }
        });
        let provider = EmbeddingProvider::new(vec![lazy]);

        assert!(provider.encode("dog").await.is_err());
        assert!(provider.encode("dog").await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_first_use_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let lazy = LazyBackend::new(BackendKind::Primary, "minilm", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Arc::new(StaticBackend::uniform("minilm", vec![1.0, 2.0])) as Arc<dyn EmbeddingBackend>)
        });
        let provider = Arc::new(EmbeddingProvider::new(vec![lazy]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.encode("dog").await.map(|v| v.dim) })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 2);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn construction_leaves_the_runtime_free() {
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (go_tx, go_rx) = std::sync::mpsc::channel::<()>();
        let started_tx = std::sync::Mutex::new(Some(started_tx));
        let go_rx = std::sync::Mutex::new(go_rx);
        let lazy = LazyBackend::new(BackendKind::Primary, "minilm", move || {
            if let Some(tx) = started_tx.lock().unwrap().take() {
                let _ = tx.send(());
            }
            go_rx
                .lock()
                .unwrap()
                .recv_timeout(std::time::Duration::from_secs(2))
                .map_err(|_| SemanticError::Inference("runtime was blocked".into()))?;
            Ok(Arc::new(StaticBackend::uniform("minilm", vec![1.0])) as Arc<dyn EmbeddingBackend>)
        });
        let provider = Arc::new(EmbeddingProvider::new(vec![lazy]));

        let encoding = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.encode("dog").await })
        };
        // Only reachable while the loader is parked if it runs off this thread.
        started_rx.await.unwrap();
        go_tx.send(()).unwrap();

        let vector = encoding.await.unwrap().unwrap();
        assert_eq!(vector.backend, BackendKind::Primary);
    }

    #[tokio::test]
    async fn warm_up_reports_each_backend() {
        let provider = EmbeddingProvider::new(vec![
            ready(BackendKind::Primary, FailingBackend::new("minilm")),
            ready(BackendKind::Secondary, StaticBackend::uniform("bge", vec![1.0])),
        ]);
        let statuses = provider.warm_up().await;
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].last_error.is_some());
        assert!(statuses[1].loaded);
        assert!(statuses[1].last_error.is_none());
    }

    #[test]
    fn from_config_registers_secondary_only_with_dir() {
        let cfg = SemanticConfig::default();
        let provider = EmbeddingProvider::from_config(&cfg).unwrap();
        assert_eq!(provider.backends().len(), 1);
        assert!(!provider.backends()[0].is_loaded());

        let cfg = SemanticConfig {
            secondary_model_dir: Some("/models/bge".into()),
            ..Default::default()
        };
        let provider = EmbeddingProvider::from_config(&cfg).unwrap();
        let kinds: Vec<_> = provider.backends().iter().map(LazyBackend::kind).collect();
        assert_eq!(kinds, [BackendKind::Primary, BackendKind::Secondary]);
        assert_eq!(provider.accelerator(), Accelerator::Cpu);
    }

    #[tokio::test]
    async fn missing_artifacts_make_provider_unavailable() {
        let cfg = SemanticConfig {
            model_path: "/nope/model.onnx".into(),
            secondary_model_dir: Some("/nope/bge".into()),
            ..Default::default()
        };
        let provider = EmbeddingProvider::from_config(&cfg).unwrap();
        let err = provider.encode("dog").await.unwrap_err();
        assert!(matches!(err, SemanticError::Unavailable(_)));
    }

    #[test]
    fn finalize_rejects_count_mismatch() {
        let err = finalize_vectors(vec![vec![1.0]], 2, BackendKind::Primary, "m").unwrap_err();
        assert!(err.to_string().contains("1 vectors for 2 inputs"));
    }

    #[test]
    fn finalize_rejects_ragged_dims() {
        let err = finalize_vectors(
            vec![vec![1.0, 0.0], vec![1.0]],
            2,
            BackendKind::Primary,
            "m",
        )
        .unwrap_err();
        assert!(err.to_string().contains("inconsistent"));
    }
}
