//! Error types for the renderer service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors raised by a PDF engine
#[derive(Error, Debug)]
pub enum RenderError {
    /// Browser could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Page could not be loaded
    #[error("Failed to load page: {0}")]
    Page(String),

    /// Print-to-PDF failed
    #[error("Failed to print PDF: {0}")]
    Print(String),

    /// Scratch file handling failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid service configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable could not be read into its setting
    #[error("Failed to load renderer settings: {0}")]
    Load(#[from] ::config::ConfigError),

    /// A setting parsed but is out of range
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors returned to HTTP callers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request
    #[error("{0}")]
    BadRequest(String),

    /// Body could not be extracted (bad JSON, too large, wrong content type)
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// All render slots are taken
    #[error("Server busy: {max} render(s) already in progress")]
    Busy { max: usize },

    /// Render exceeded the configured timeout
    #[error("Rendering timed out after {0}s")]
    Timeout(u64),

    /// Engine failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
