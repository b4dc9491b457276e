//! Error taxonomy shared by every layer of the service.
//!
//! Collaborator failures are converted into [`Error`] at the point where they
//! occur and travel unchanged up to the HTTP boundary, where
//! [`IntoResponse`] turns them into a status code and a JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bb8_redis::{bb8, redis};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid state")]
    StateMismatch,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Spotify request failed: {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Malformed Spotify response: {0}")]
    Decode(String),

    #[error("No tracks to aggregate")]
    EmptyResult,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::StateMismatch | Self::InvalidToken(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::EmptyResult => StatusCode::NO_CONTENT,
            Self::Upstream { .. }
            | Self::Decode(_)
            | Self::Storage(_)
            | Self::Cache(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StateMismatch => "STATE_MISMATCH",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::EmptyResult => "EMPTY_RESULT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::upstream(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<bb8::RunError<redis::RedisError>> for Error {
    fn from(err: bb8::RunError<redis::RedisError>) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(err.to_string())
    }
}
