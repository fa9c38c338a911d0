//! Renderer client
//!
//! Starts the `md2pdf-renderer` service as a child process, waits for it to
//! report healthy, sends render requests and shuts it down again.

use std::env;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use md2pdf_core::{PdfOptions, RendererSettings};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ClientError, Result};

/// Default renderer port
pub const DEFAULT_PORT: u16 = 3000;

/// Default render request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of health checks after spawning the server
pub const DEFAULT_STARTUP_RETRIES: u32 = 10;

/// Default delay between health checks
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Timeout for health and shutdown requests
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time a stopping server gets before it is killed
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Renderer binary name
pub const SERVER_BINARY: &str = "md2pdf-renderer";

/// Environment variable overriding the renderer binary location
pub const SERVER_ENV: &str = "MD2PDF_RENDERER";

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub active_requests: usize,
    #[serde(default)]
    pub max_concurrent: usize,
    /// Process id of the answering service
    #[serde(default)]
    pub pid: Option<u32>,
}

impl HealthStatus {
    /// The service is ready for requests
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Client for the md2pdf renderer service
///
/// # Example
///
/// ```no_run
/// use md2pdf_client::RendererClient;
///
/// // Spawns the renderer, stops it again when `client` is dropped
/// let client = RendererClient::start()?;
/// let pdf = client.render_pdf("<html><body><h1>Hi</h1></body></html>", None)?;
/// assert!(pdf.starts_with(b"%PDF-"));
/// # Ok::<(), md2pdf_client::ClientError>(())
/// ```
#[derive(Debug)]
pub struct RendererClient {
    port: u16,
    base_url: String,
    timeout: Duration,
    startup_retries: u32,
    retry_delay: Duration,
    shutdown_grace: Duration,
    server_path: Option<PathBuf>,
    /// False when attached to a service someone else runs
    managed: bool,
    http: Client,
    server_process: Option<Child>,
}

impl RendererClient {
    /// Create a client for a renderer on the default port
    pub fn new() -> Result<Self> {
        let http = Client::builder().build().map_err(ClientError::Http)?;
        Ok(Self {
            port: DEFAULT_PORT,
            base_url: local_url(DEFAULT_PORT),
            timeout: DEFAULT_TIMEOUT,
            startup_retries: DEFAULT_STARTUP_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            shutdown_grace: SHUTDOWN_GRACE,
            server_path: None,
            managed: true,
            http,
            server_process: None,
        })
    }

    /// Create a client from the `renderer` config section
    pub fn from_config(settings: &RendererSettings) -> Result<Self> {
        let mut client = Self::new()?
            .with_port(settings.port)
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        client.startup_retries = settings.startup_retries;
        client.retry_delay = Duration::from_millis(settings.retry_delay_ms);
        client.server_path = settings.server_path.clone();
        Ok(client)
    }

    /// Use an already running renderer; the client never spawns or kills it
    pub fn attach(base_url: impl Into<String>) -> Result<Self> {
        let mut client = Self::new()?;
        client.base_url = base_url.into().trim_end_matches('/').to_string();
        client.managed = false;
        Ok(client)
    }

    /// Create and start a managed renderer
    pub fn start() -> Result<Self> {
        let mut client = Self::new()?;
        client.start_server()?;
        Ok(client)
    }

    /// Set the port the spawned renderer listens on
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        if self.managed {
            self.base_url = local_url(port);
        }
        self
    }

    /// Set the render request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long [`stop_server`](Self::stop_server) waits before killing
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Use an explicit renderer binary
    pub fn with_server_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.server_path = Some(path.into());
        self
    }

    /// Port of the managed renderer
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL requests go to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Render request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start the renderer with the configured retry policy
    pub fn start_server(&mut self) -> Result<()> {
        self.start_server_with(self.startup_retries, self.retry_delay)
    }

    /// Start the renderer and wait until it reports healthy
    ///
    /// Does nothing if this client already holds a running process. An
    /// attached client only waits for the remote service to become healthy.
    ///
    /// A managed client only accepts a healthy reply from its own child.
    /// If the port already belongs to another renderer the child fails to
    /// bind and exits, which ends the wait with
    /// [`ClientError::StartupFailed`].
    pub fn start_server_with(&mut self, max_retries: u32, retry_delay: Duration) -> Result<()> {
        if self.server_process.is_some() {
            return Ok(());
        }

        if self.managed {
            let program = self.resolve_server_program()?;
            tracing::info!("Starting renderer {} on port {}", program.display(), self.port);

            let child = Command::new(&program)
                .env("PORT", self.port.to_string())
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|source| match source.kind() {
                    ErrorKind::NotFound => ClientError::ServerNotFound(program.clone()),
                    _ => ClientError::Spawn {
                        path: program.clone(),
                        source,
                    },
                })?;
            self.server_process = Some(child);
        }

        for attempt in 1..=max_retries {
            if self.server_process.is_some() && !self.is_server_running() {
                tracing::warn!("Renderer process exited during startup");
                break;
            }

            match self.health_check() {
                Ok(health) if health.is_healthy() && self.is_own_reply(&health) => {
                    tracing::info!("Renderer ready after {} health check(s)", attempt);
                    return Ok(());
                }
                Ok(health) if health.is_healthy() => {
                    tracing::warn!(
                        "Port {} is answered by another renderer (pid {:?})",
                        self.port,
                        health.pid
                    );
                }
                Ok(health) => {
                    tracing::debug!("Renderer not ready yet: status {}", health.status);
                }
                Err(e) => {
                    tracing::debug!("Health check {} of {} failed: {}", attempt, max_retries, e);
                }
            }

            thread::sleep(retry_delay);
        }

        self.stop_server();
        Err(ClientError::StartupFailed {
            attempts: max_retries,
        })
    }

    /// Stop the managed renderer
    ///
    /// Asks the service to shut down, waits up to the shutdown grace period
    /// ([`SHUTDOWN_GRACE`] by default) and kills the process if it is still
    /// alive. Only the child's own service is ever sent `/shutdown`.
    pub fn stop_server(&mut self) {
        let Some(mut child) = self.server_process.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!("Renderer already exited with {}", status);
                return;
            }
            Ok(None) => self.request_shutdown(child.id()),
            Err(e) => tracing::warn!("Could not poll renderer process: {}", e),
        }

        let deadline = Instant::now() + self.shutdown_grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("Renderer exited with {}", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(50)),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Could not poll renderer process: {}", e);
                    break;
                }
            }
        }

        tracing::warn!("Renderer did not exit in time, killing it");
        if let Err(e) = child.kill() {
            tracing::warn!("Failed to kill renderer: {}", e);
        }
        let _ = child.wait();
    }

    /// Send `POST /shutdown` if the service on our port is process `pid`
    fn request_shutdown(&self, pid: u32) {
        match self.health_check() {
            Ok(health) if health.pid.map_or(true, |answering| answering == pid) => {}
            Ok(health) => {
                tracing::warn!(
                    "Not shutting down renderer pid {:?}, it was not started here",
                    health.pid
                );
                return;
            }
            Err(e) => {
                tracing::debug!("Renderer not answering before shutdown: {}", e);
                return;
            }
        }

        if let Err(e) = self
            .http
            .post(self.url("/shutdown"))
            .timeout(CONTROL_TIMEOUT)
            .send()
        {
            tracing::debug!("Shutdown request failed: {}", e);
        }
    }

    /// A healthy reply counts only if it came from the live child, when
    /// there is one
    fn is_own_reply(&mut self, health: &HealthStatus) -> bool {
        let Some(child) = self.server_process.as_mut() else {
            return true;
        };
        if !matches!(child.try_wait(), Ok(None)) {
            return false;
        }
        health.pid.map_or(true, |pid| pid == child.id())
    }

    /// Whether this client holds a live renderer process
    pub fn is_server_running(&mut self) -> bool {
        match self.server_process.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Query `GET /health`
    pub fn health_check(&self) -> Result<HealthStatus> {
        const OPERATION: &str = "Health check";

        let request = self.http.get(self.url("/health")).timeout(CONTROL_TIMEOUT);
        let response = self.send(OPERATION, request, CONTROL_TIMEOUT)?;
        response
            .json()
            .map_err(|source| ClientError::Server {
                operation: OPERATION,
                source,
            })
    }

    /// Render an HTML document to PDF bytes
    pub fn render_pdf(&self, html: &str, options: Option<&PdfOptions>) -> Result<Vec<u8>> {
        const OPERATION: &str = "PDF rendering";

        let payload = match options {
            Some(options) => json!({ "html": html, "options": options }),
            None => json!({ "html": html, "options": {} }),
        };

        let request = self
            .http
            .post(self.url("/render/pdf"))
            .json(&payload)
            .timeout(self.timeout);
        let response = self.send(OPERATION, request, self.timeout)?;
        let bytes = response.bytes().map_err(|e| self.map_error(OPERATION, e, self.timeout))?;

        if !bytes.starts_with(b"%PDF-") {
            tracing::warn!("Renderer returned {} bytes without a PDF header", bytes.len());
        }

        Ok(bytes.to_vec())
    }

    /// Pass HTML through the renderer unchanged
    pub fn render_html(&self, html: &str) -> Result<String> {
        const OPERATION: &str = "HTML rendering";

        let request = self
            .http
            .post(self.url("/render/html"))
            .json(&json!({ "html": html }))
            .timeout(self.timeout);
        let response = self.send(OPERATION, request, self.timeout)?;
        response
            .text()
            .map_err(|e| self.map_error(OPERATION, e, self.timeout))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response> {
        let response = request
            .send()
            .map_err(|e| self.map_error(operation, e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Status {
                operation,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response)
    }

    fn map_error(&self, operation: &'static str, error: reqwest::Error, timeout: Duration) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout {
                operation,
                secs: timeout.as_secs(),
            }
        } else {
            ClientError::Server {
                operation,
                source: error,
            }
        }
    }

    /// Locate the renderer binary
    ///
    /// Order: explicit path, `MD2PDF_RENDERER`, next to the current
    /// executable, then whatever `PATH` resolves.
    fn resolve_server_program(&self) -> Result<PathBuf> {
        let explicit = self.server_path.clone().or_else(|| {
            env::var_os(SERVER_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        if let Some(path) = explicit {
            return if path.exists() {
                Ok(path)
            } else {
                Err(ClientError::ServerNotFound(path))
            };
        }

        let sibling = env::current_exe().ok().and_then(|exe| {
            exe.parent()
                .map(|dir| dir.join(format!("{}{}", SERVER_BINARY, env::consts::EXE_SUFFIX)))
        });
        match sibling {
            Some(path) if path.is_file() => Ok(path),
            _ => Ok(PathBuf::from(SERVER_BINARY)),
        }
    }
}

impl Drop for RendererClient {
    fn drop(&mut self) {
        self.stop_server();
    }
}

fn local_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// Pull `error` out of a JSON error body, or use the body as is
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
