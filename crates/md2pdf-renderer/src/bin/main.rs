//! md2pdf-renderer binary

use std::sync::Arc;

use anyhow::{Context, Result};
use md2pdf_renderer::{serve, AppState, ChromeEngine, ChromeSettings, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env().context("Invalid renderer configuration")?;

    let engine = Arc::new(ChromeEngine::new(ChromeSettings {
        chrome_path: config.chrome_path.clone(),
        sandbox: config.chrome_sandbox,
        ready_timeout: config.render_timeout / 2,
    }));

    // Launch Chrome now so the first render does not pay for it; a failure
    // here is retried on the first request.
    let warm = Arc::clone(&engine);
    tokio::task::spawn_blocking(move || {
        if let Err(e) = warm.warm_up() {
            tracing::warn!("{}", e);
        }
    });

    let address = ("127.0.0.1", config.port);
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind 127.0.0.1:{}", config.port))?;

    tracing::info!(
        "md2pdf-renderer {} listening on http://127.0.0.1:{} (max {} concurrent)",
        md2pdf_renderer::VERSION,
        config.port,
        config.max_concurrent
    );

    let state = AppState::new(engine, &config);
    serve(listener, state).await.context("Server error")?;

    tracing::info!("md2pdf-renderer stopped");
    Ok(())
}
