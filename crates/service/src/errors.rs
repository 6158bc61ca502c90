use crate::pipeline::PipelineError;
use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Missing file field")]
    MissingFile,

    #[error("{}", .0.body_text())]
    NotMultipart(#[from] MultipartRejection),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(PipelineError::InvalidImage(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::ModelUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotMultipart(e) => e.status(),
            ApiError::Multipart(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for logs and metric attributes.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Pipeline(PipelineError::InvalidImage(_)) => "invalid_image",
            ApiError::Pipeline(PipelineError::ModelUnavailable { .. }) => "model_unavailable",
            ApiError::MissingFile => "missing_file",
            ApiError::NotMultipart(_) | ApiError::Multipart(_) => "bad_multipart",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Pipeline(PipelineError::ModelUnavailable { model, .. }) => json!({
                "detail": self.to_string(),
                "error_code": self.kind(),
                "model": model,
            }),
            _ => json!({ "detail": self.to_string() }),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
