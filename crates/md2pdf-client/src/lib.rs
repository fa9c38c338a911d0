//! md2pdf-client - talk to the md2pdf renderer service
//!
//! The renderer is a separate process (`md2pdf-renderer`) that turns HTML
//! into PDF with a headless browser. [`RendererClient`] owns that process:
//! it starts it, polls `/health` until it is ready, posts render requests
//! with a timeout and stops it again.
//!
//! ```no_run
//! use md2pdf_client::RendererClient;
//!
//! let mut client = RendererClient::new()?;
//! client.start_server()?;
//! let pdf = client.render_pdf("<html><body><h1>Test</h1></body></html>", None)?;
//! client.stop_server();
//! # let _ = pdf;
//! # Ok::<(), md2pdf_client::ClientError>(())
//! ```

pub mod client;
pub mod error;

pub use client::{
    HealthStatus, RendererClient, DEFAULT_PORT, DEFAULT_TIMEOUT, SERVER_BINARY, SERVER_ENV,
    SHUTDOWN_GRACE,
};
pub use error::{ClientError, Result};
