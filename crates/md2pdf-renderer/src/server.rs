//! HTTP routes
//!
//! | Route          | Method | Body              | Response            |
//! |----------------|--------|-------------------|---------------------|
//! | `/health`      | GET    |                   | JSON status         |
//! | `/render/pdf`  | POST   | `{html, options}` | `application/pdf`   |
//! | `/render/html` | POST   | `{html}`          | `text/html`         |
//! | `/shutdown`    | POST   |                   | JSON, then exit     |

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use md2pdf_core::{PaperSize, PdfOptions};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::admission::Admission;
use crate::config::ServerConfig;
use crate::engine::PdfEngine;
use crate::error::ApiError;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "md2pdf-renderer";

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn PdfEngine>,
    admission: Admission,
    render_timeout: Duration,
    body_limit: usize,
    shutdown: Arc<Notify>,
}

impl AppState {
    pub fn new(engine: Arc<dyn PdfEngine>, config: &ServerConfig) -> Self {
        Self {
            engine,
            admission: Admission::new(config.max_concurrent),
            render_timeout: config.render_timeout,
            body_limit: config.body_limit_bytes,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn admission(&self) -> &Admission {
        &self.admission
    }

    /// Handle that fires when the service should stop
    pub fn shutdown_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }
}

/// `/health` response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    active_requests: usize,
    max_concurrent: usize,
    pid: u32,
}

#[derive(Debug, Deserialize)]
struct RenderPdfRequest {
    #[serde(default)]
    html: String,
    #[serde(default)]
    options: Option<PdfOptions>,
}

#[derive(Debug, Deserialize)]
struct RenderHtmlRequest {
    #[serde(default)]
    html: String,
}

/// Build the router
pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/health", get(health))
        .route("/render/pdf", post(render_pdf))
        .route("/render/html", post(render_html))
        .route("/shutdown", post(shutdown))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve until `/shutdown` is called or Ctrl-C arrives
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let shutdown = state.shutdown_signal();
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown.notified() => tracing::info!("Shutdown requested"),
                _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
            }
        })
        .await
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: crate::VERSION,
        active_requests: state.admission.in_flight(),
        max_concurrent: state.admission.max(),
        pid: std::process::id(),
    })
}

async fn render_pdf(
    State(state): State<AppState>,
    payload: Result<Json<RenderPdfRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let permit = state.admission.try_acquire().ok_or(ApiError::Busy {
        max: state.admission.max(),
    })?;

    let Json(request) = payload?;
    if request.html.trim().is_empty() {
        return Err(ApiError::BadRequest("HTML content is required".to_string()));
    }
    let options = request.options.unwrap_or_default();
    validate_options(&options)?;

    tracing::info!(
        "Rendering PDF ({} bytes, {}{})",
        request.html.len(),
        options.paper_size(),
        if options.landscape { ", landscape" } else { "" }
    );

    // The permit moves into the blocking task so a render that outlives the
    // timeout keeps its slot until Chrome actually lets go.
    let engine = Arc::clone(&state.engine);
    let html = request.html;
    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        engine.render_pdf(&html, &options)
    });

    let pdf = match tokio::time::timeout(state.render_timeout, task).await {
        Err(_) => return Err(ApiError::Timeout(state.render_timeout.as_secs())),
        Ok(Err(join)) => return Err(ApiError::Internal(join.to_string())),
        Ok(Ok(result)) => result?,
    };

    tracing::info!("Rendered PDF ({} bytes)", pdf.len());
    Ok(([(header::CONTENT_TYPE, "application/pdf")], pdf).into_response())
}

async fn render_html(
    State(state): State<AppState>,
    payload: Result<Json<RenderHtmlRequest>, JsonRejection>,
) -> Result<Html<String>, ApiError> {
    let _permit = state.admission.try_acquire().ok_or(ApiError::Busy {
        max: state.admission.max(),
    })?;

    let Json(request) = payload?;
    if request.html.trim().is_empty() {
        return Err(ApiError::BadRequest("HTML content is required".to_string()));
    }
    Ok(Html(request.html))
}

async fn shutdown(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.shutdown.notify_one();
    Json(serde_json::json!({ "status": "shutting down" }))
}

fn validate_options(options: &PdfOptions) -> Result<(), ApiError> {
    if PaperSize::from_name(&options.format).is_none() {
        let known: Vec<&str> = PaperSize::ALL.iter().map(|size| size.name()).collect();
        return Err(ApiError::BadRequest(format!(
            "Unknown paper format '{}'. Expected one of: {}",
            options.format,
            known.join(", ")
        )));
    }
    for (side, value) in options.margin.sides() {
        if md2pdf_core::parse_length_inches(value).is_none() {
            return Err(ApiError::BadRequest(format!(
                "Invalid {} margin '{}'",
                side, value
            )));
        }
    }
    Ok(())
}
