//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use unmix_engine::EngineError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad request: missing, empty, or disallowed upload.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown session or track.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Engine failure: tool invocation, output discovery, or workspace I/O.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message. Invocation failures carry the tool's
    /// full combined diagnostics to aid operator debugging.
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Engine(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();

        match &self {
            ServerError::BadRequest(_) | ServerError::NotFound(_) => {
                tracing::warn!(status = %status, error = %message, "Client error");
            }
            _ => {
                tracing::error!(status = %status, error = %message, "Server error");
            }
        }

        let body = ErrorResponse { error: message };

        (status, Json(body)).into_response()
    }
}
