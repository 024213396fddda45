use inference::Outcome;
use semantic::{cosine_similarity, BackendKind, EmbeddingProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::metrics::MatchMetrics;
use crate::types::{DuplicateMatch, DuplicateResult};

/// Compares a report against caller-supplied candidates.
pub struct DuplicateDetector {
    embeddings: Arc<EmbeddingProvider>,
    metrics: Option<Arc<dyn MatchMetrics>>,
}

impl DuplicateDetector {
    pub fn new(embeddings: Arc<EmbeddingProvider>) -> Self {
        Self {
            embeddings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Candidates whose similarity to `query` is at least `threshold`.
    ///
    /// Query and candidates are embedded in one dispatch, so every vector
    /// comes from the same backend. When no backend can embed the batch the
    /// result is an empty, non-duplicate [`Outcome::Degraded`].
    pub async fn find(
        &self,
        query: &str,
        candidates: &[String],
        threshold: f32,
    ) -> Outcome<DuplicateResult> {
        let started = Instant::now();
        if candidates.is_empty() {
            self.record(None, started, 0, 0);
            return Outcome::complete(DuplicateResult::empty());
        }

        let mut texts: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
        texts.push(query);
        texts.extend(candidates.iter().map(String::as_str));

        let batch = match self.embeddings.encode_batch(&texts).await {
            Ok(batch) => batch,
            Err(err) => {
                warn!(
                    candidates = candidates.len(),
                    error = %err,
                    "duplicate detection skipped: no embedding backend"
                );
                self.record(None, started, candidates.len(), 0);
                return Outcome::degraded(DuplicateResult::empty(), err.to_string());
            }
        };

        let Some((query_vec, candidate_vecs)) = batch.vectors.split_first() else {
            self.record(None, started, candidates.len(), 0);
            return Outcome::degraded(DuplicateResult::empty(), "embedding batch was empty");
        };

        let similarities: Vec<f32> = candidate_vecs
            .iter()
            .map(|v| cosine_similarity(&query_vec.values, &v.values))
            .collect();
        let result = rank_matches(candidates, &similarities, threshold);

        debug!(
            backend = %batch.backend,
            candidates = candidates.len(),
            matches = result.matches.len(),
            threshold,
            "duplicate detection finished"
        );
        self.record(
            Some(batch.backend),
            started,
            candidates.len(),
            result.matches.len(),
        );
        Outcome::complete(result)
    }

    fn record(
        &self,
        backend: Option<BackendKind>,
        started: Instant,
        candidate_count: usize,
        match_count: usize,
    ) {
        if let Some(metrics) = &self.metrics {
            metrics.record_detection(backend, started.elapsed(), candidate_count, match_count);
        }
    }
}

/// Keeps candidates with `similarity >= threshold`, sorted descending.
///
/// The sort is stable, so equal similarities keep their candidate order.
/// `NaN` similarities never pass the threshold.
pub fn rank_matches(candidates: &[String], similarities: &[f32], threshold: f32) -> DuplicateResult {
    let mut matches: Vec<DuplicateMatch> = candidates
        .iter()
        .zip(similarities.iter().copied())
        .filter(|(_, similarity)| *similarity >= threshold)
        .map(|(text, similarity)| DuplicateMatch {
            text: text.clone(),
            similarity,
        })
        .collect();

    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    DuplicateResult::from_matches(matches)
}
