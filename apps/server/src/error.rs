use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use konspekt_core::KonspektError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Note not found")]
    NotFound,

    #[error("You've reached the limit of {limit} videos.")]
    QuotaExceeded { limit: usize },

    #[error("Note generation failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<KonspektError> for ApiError {
    fn from(err: KonspektError) -> Self {
        match err {
            KonspektError::InvalidVideoUrl { .. }
            | KonspektError::TranscriptsDisabled { .. }
            | KonspektError::NoTranscript { .. }
            | KonspektError::TranscriptFetchFailed { .. } => ApiError::BadRequest(err.to_string()),
            KonspektError::CompletionFailed { .. }
            | KonspektError::MalformedResponse { .. }
            | KonspektError::ApiError(_) => ApiError::Upstream(err.to_string()),
            KonspektError::MissingApiKey { .. }
            | KonspektError::IoError(_)
            | KonspektError::JsonError(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::QuotaExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, "quota_exceeded"),
            ApiError::Upstream(message) => {
                tracing::error!(error = %message, "note generation failed");
                (StatusCode::BAD_GATEWAY, "upstream_failed")
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}
