// Metrics hooks for duplicate detection.
//
// A `MatchMetrics` implementation handed to `DuplicateDetector::with_metrics`
// receives one call per `find`.
use std::time::Duration;

use semantic::BackendKind;

/// Metrics observer for duplicate detection.
pub trait MatchMetrics: Send + Sync {
    /// Record one detection.
    ///
    /// `backend` is `None` when no embedding was computed (no candidates, or
    /// every backend failed). `match_count` counts results after thresholding.
    fn record_detection(
        &self,
        backend: Option<BackendKind>,
        latency: Duration,
        candidate_count: usize,
        match_count: usize,
    );
}
