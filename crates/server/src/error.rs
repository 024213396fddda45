use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use triage::PipelineError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(PipelineError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::ResourceUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServerError::Pipeline(PipelineError::Model { .. } | PipelineError::Config(_))
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Pipeline(PipelineError::Validation(_)) => "VALIDATION_ERROR",
            ServerError::Pipeline(PipelineError::ResourceUnavailable(_)) => "RESOURCE_UNAVAILABLE",
            ServerError::Pipeline(PipelineError::Model { .. }) => "MODEL_ERROR",
            ServerError::Pipeline(PipelineError::Config(_)) | ServerError::Config(_) => {
                "CONFIG_ERROR"
            }
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(err: JsonRejection) -> Self {
        ServerError::BadRequest(err.body_text())
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference::InferenceError;

    #[test]
    fn pipeline_errors_map_to_status() {
        let cases = [
            (
                ServerError::from(PipelineError::Validation("text is required".into())),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ServerError::from(PipelineError::ResourceUnavailable("no backend".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "RESOURCE_UNAVAILABLE",
            ),
            (
                ServerError::from(PipelineError::Model {
                    stage: "summarizer",
                    source: InferenceError::Request("timeout".into()),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "MODEL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = ServerError::from(PipelineError::Validation("text is required".into()));
        assert_eq!(err.to_string(), "validation failed: text is required");
    }
}
