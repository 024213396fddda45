//! # Duplicate detection (`matcher`)
//!
//! Given a new field report and a list of earlier report texts, decide which
//! earlier reports describe the same incident.
//!
//! The caller supplies the candidates; nothing is persisted here. Query and
//! candidates are embedded together through
//! [`EmbeddingProvider::encode_batch`](semantic::EmbeddingProvider::encode_batch),
//! scored with cosine similarity, filtered with an inclusive threshold
//! ([`DEFAULT_THRESHOLD`] = 0.82), and returned best-first.
//!
//! Duplicate detection is advisory. If no embedding backend is available the
//! detector answers "no duplicates" as an [`Outcome::Degraded`](inference::Outcome)
//! rather than failing the request.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use matcher::{DuplicateDetector, DEFAULT_THRESHOLD};
//! use semantic::{EmbeddingProvider, SemanticConfig};
//!
//! # async fn run() -> Result<(), semantic::SemanticError> {
//! let provider = Arc::new(EmbeddingProvider::from_config(&SemanticConfig::default())?);
//! let detector = DuplicateDetector::new(provider);
//! let candidates = vec!["Injured dog near the temple gate".to_string()];
//! let outcome = detector
//!     .find("Dog with a bleeding leg at the temple gate", &candidates, DEFAULT_THRESHOLD)
//!     .await;
//! println!("duplicate? {}", outcome.value().is_duplicate);
//! # Ok(())
//! # }
//! ```

mod detector;
mod metrics;
mod types;

pub use crate::detector::{rank_matches, DuplicateDetector};
pub use crate::metrics::MatchMetrics;
pub use crate::types::{DuplicateMatch, DuplicateResult, DEFAULT_THRESHOLD};
