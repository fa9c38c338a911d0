//! Error types for renderer client operations

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while managing or talking to the renderer
#[derive(Error, Debug)]
pub enum ClientError {
    /// Renderer binary could not be located
    #[error("Renderer server not found: {}", .0.display())]
    ServerNotFound(PathBuf),

    /// Renderer process could not be spawned
    #[error("Failed to launch renderer {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Renderer never reported healthy
    #[error("Renderer server failed to start after {attempts} health checks")]
    StartupFailed { attempts: u32 },

    /// Request exceeded the configured timeout
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    /// Renderer answered with a non-success status
    #[error("{operation} failed ({status}): {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// Connection or protocol failure
    #[error("{operation} failed: {source}")]
    Server {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Could not build the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    Http(#[source] reqwest::Error),
}

impl ClientError {
    /// True when the renderer refused the request because it was at capacity
    pub fn is_busy(&self) -> bool {
        matches!(self, ClientError::Status { status: 503, .. })
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
