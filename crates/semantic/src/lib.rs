//! Semantic fingerprints for field reports.
//!
//! This crate turns report text into unit-length embedding vectors. It knows
//! about two kinds of backend:
//!
//! - **Primary** - a sentence-embedding model, run locally through ONNX
//!   Runtime (`mode = "onnx"`) or called over HTTP (`mode = "api"`).
//! - **Secondary** - a plain transformer encoder loaded from a local
//!   directory; token states are mean-pooled under the attention mask.
//!
//! [`EmbeddingProvider`] holds the backends in priority order. Each one is
//! built lazily the first time it is needed and kept for the life of the
//! process; a backend that failed to build is tried again on the next call.
//! A single dispatch routine walks the list and the first backend that can
//! encode the *whole* batch wins, so vectors handed back together are always
//! comparable.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{EmbeddingProvider, SemanticConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), semantic::SemanticError> {
//!     let provider = EmbeddingProvider::from_config(&SemanticConfig::default())?;
//!     let vector = provider.encode("stray dog limping near the bus stand").await?;
//!     assert_eq!(vector.values.len(), vector.dim);
//!     Ok(())
//! }
//! ```
//!
//! ## Threading notes
//!
//! ONNX sessions are shared process-wide behind a mutex because
//! `Session::run` needs exclusive access. Tokenizers are immutable and shared
//! freely.

pub mod backend;
pub mod config;
pub mod error;
pub mod provider;
pub mod similarity;
pub mod types;

mod assets;
mod normalize;
mod onnx;

#[doc(hidden)]
pub mod test_support;

pub use crate::backend::{ApiBackend, EmbeddingBackend, OnnxBackend};
pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::normalize::l2_normalize_in_place;
pub use crate::provider::{EmbeddingProvider, LazyBackend};
pub use crate::similarity::cosine_similarity;
pub use crate::types::{Accelerator, BackendKind, BackendStatus, EmbeddingBatch, EmbeddingVector};
