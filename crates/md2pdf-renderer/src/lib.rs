//! md2pdf-renderer - HTML to PDF rendering service
//!
//! A small HTTP service that prints self-contained HTML documents to PDF
//! with headless Chrome. The md2pdf CLI starts one instance per batch and
//! talks to it through `md2pdf-client`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use md2pdf_renderer::{serve, AppState, ChromeEngine, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let state = AppState::new(Arc::new(ChromeEngine::default()), &config);
//! let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
//! serve(listener, state).await?;
//! ```

pub mod admission;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;

pub use admission::{Admission, Permit};
pub use config::ServerConfig;
pub use engine::{print_options, ChromeEngine, ChromeSettings, PdfEngine, READY_SELECTOR};
pub use error::{ApiError, ConfigError, RenderError};
pub use server::{router, serve, AppState, SERVICE_NAME};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
