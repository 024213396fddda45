use inference::InferenceError;
use thiserror::Error;

/// Failures surfaced by the triage pipeline.
///
/// Optional subsystems (entity tagging, embeddings inside the unified
/// pipeline, duplicate detection) never produce these; they degrade instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request itself is unusable. Retrying will not help.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A required resource (e.g. every embedding backend) is unavailable.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
    /// A mandatory model capability failed.
    #[error("{stage} model failed: {source}")]
    Model {
        stage: &'static str,
        #[source]
        source: InferenceError,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn model(stage: &'static str) -> impl FnOnce(InferenceError) -> Self {
        move |source| PipelineError::Model { stage, source }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_names_stage() {
        let err = PipelineError::model("sentiment")(InferenceError::Request("timeout".into()));
        assert_eq!(err.to_string(), "sentiment model failed: inference request failed: timeout");
        assert!(!err.is_client_error());
    }

    #[test]
    fn validation_is_client_error() {
        assert!(PipelineError::Validation("text is required".into()).is_client_error());
        assert!(!PipelineError::ResourceUnavailable("no backend".into()).is_client_error());
    }
}
