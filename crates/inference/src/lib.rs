//! Model capabilities used by the triage pipeline.
//!
//! Every pretrained model the pipeline talks to sits behind a small async
//! trait that returns a typed record:
//!
//! - [`SentimentModel`] yields a [`SentimentResult`] (`positive`/`negative`)
//! - [`ZeroShotModel`] yields a [`CategoryResult`], in the order the model ranked it
//! - [`SummaryModel`] yields abstractive summary text
//! - [`EntityTagger`] yields aggregated [`NerSpan`]s
//!
//! Raw model payloads are validated here, at the capability boundary, so the
//! rest of the system never sees loosely-typed JSON.
//!
//! [`HfInferenceClient`] implements all four traits against a Hugging Face
//! compatible inference endpoint. Tests swap in fakes from [`test_support`].
//!
//! [`Outcome`] is shared by the optional subsystems (NER, embeddings) so
//! callers can tell a degraded-but-usable value from a complete one.

pub mod capability;
pub mod config;
pub mod error;
pub mod hf;
pub mod outcome;
pub mod types;

#[doc(hidden)]
pub mod test_support;

pub use crate::capability::{EntityTagger, SentimentModel, SummaryModel, ZeroShotModel};
pub use crate::config::InferenceConfig;
pub use crate::error::InferenceError;
pub use crate::hf::HfInferenceClient;
pub use crate::outcome::Outcome;
pub use crate::types::{
    CategoryResult, NerSpan, ScoredLabel, SentimentLabel, SentimentResult, SummaryParams,
};
