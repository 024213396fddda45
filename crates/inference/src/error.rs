use thiserror::Error;

/// Failures raised by a model capability.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InferenceError {
    /// Configuration cannot produce a working client.
    #[error("invalid inference config: {0}")]
    InvalidConfig(String),
    /// The request never produced a response (connect, timeout, TLS).
    #[error("inference request failed: {0}")]
    Request(String),
    /// The model endpoint answered with a non-success status.
    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The payload did not match the record the capability promises.
    #[error("unexpected model response: {0}")]
    Decode(String),
}

impl InferenceError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code_and_body() {
        let err = InferenceError::Status {
            status: 503,
            body: "model is loading".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("model is loading"));
    }

    #[test]
    fn decode_helper_wraps_message() {
        let err = InferenceError::decode("missing labels");
        assert_eq!(err, InferenceError::Decode("missing labels".into()));
        assert!(err.to_string().contains("unexpected model response"));
    }
}
