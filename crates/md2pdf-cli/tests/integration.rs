//! Integration tests for the md2pdf CLI
//!
//! These run whole batches: Markdown on disk in, HTML or PDF files out.
//! PDF batches talk to an in-process renderer backed by a stand-in engine.

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use md2pdf_cli::{run_batch, run_batch_with, BatchOptions, Converter, OutputMode};
use md2pdf_client::RendererClient;
use md2pdf_core::{Config, OutputFormat, PdfOptions};
use md2pdf_renderer::{serve, AppState, PdfEngine, RenderError, ServerConfig};
use tempfile::TempDir;

/// Records what it was asked to print
struct RecordingEngine {
    calls: Arc<AtomicUsize>,
}

impl PdfEngine for RecordingEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn render_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if html.contains("FAIL-ME") {
            return Err(RenderError::Print("refused".to_string()));
        }
        Ok(format!("%PDF-1.4\n% {} {}\n", options.format, options.margin.top).into_bytes())
    }
}

fn start_renderer(calls: Arc<AtomicUsize>) -> (String, Arc<tokio::sync::Notify>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let state = AppState::new(Arc::new(RecordingEngine { calls }), &ServerConfig::default());
    let shutdown = state.shutdown_signal();

    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let _ = serve(listener, state).await;
        });
    });

    (url, shutdown)
}

fn write_docs(dir: &Path) -> Vec<PathBuf> {
    let docs = [
        ("intro.md", "# Introduction\n\nSome *emphasis*.\n"),
        (
            "tables.md",
            "# Tables\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```mermaid\ngraph TD; A-->B;\n```\n",
        ),
    ];
    docs.iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_html_batch_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_docs(dir.path());
    let out = dir.path().join("site");

    let options = BatchOptions {
        files: vec![dir.path().join("*.md").display().to_string()],
        format: Some(OutputFormat::Html),
        theme: Some("presentation".to_string()),
        output_mode: OutputMode::Custom,
        output_dir: Some(out.clone()),
    };
    let report = run_batch(&Config::default(), &options).unwrap();

    assert_eq!(report.total, 2);
    assert!(report.all_succeeded(), "{}", report.to_text());

    let intro = fs::read_to_string(out.join("intro.html")).unwrap();
    assert!(intro.contains("<title>Introduction</title>"));
    assert!(intro.contains("<em>emphasis</em>"));

    let tables = fs::read_to_string(out.join("tables.html")).unwrap();
    assert!(tables.contains("<table>"));
    assert!(tables.contains("language-mermaid"));
    assert!(tables.contains("theme: 'dark'"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success"], 2);
    assert_eq!(
        json["results"][0]["output"],
        out.join("intro.html").display().to_string()
    );
}

#[test]
fn test_batch_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    let files = write_docs(dir.path());
    let config_path = dir.path().join("md2pdf.config.yaml");
    fs::write(&config_path, "output:\n  format: html\n  default_theme: minimal\n").unwrap();

    let config = md2pdf_cli::load_checked_config(Some(&config_path)).unwrap();
    let options = BatchOptions {
        files: vec![files[0].display().to_string()],
        ..Default::default()
    };
    let report = run_batch(&config, &options).unwrap();

    assert!(report.all_succeeded(), "{}", report.to_text());
    assert!(dir.path().join("intro.html").exists());
}

#[test]
fn test_pdf_batch_shares_one_renderer() {
    let dir = TempDir::new().unwrap();
    let files = write_docs(dir.path());
    fs::write(dir.path().join("broken.md"), "# Broken\n\nFAIL-ME\n").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let (url, shutdown) = start_renderer(Arc::clone(&calls));

    let mut config = Config::default();
    config.pdf_options.page_size = "a4".to_string();
    config.pdf_options.margins.top = "2cm".to_string();

    let converter = Converter::new(&config, OutputFormat::Pdf, "academic")
        .with_renderer(RendererClient::attach(url).unwrap());
    let options = BatchOptions {
        files: vec![dir.path().join("*.md").display().to_string()],
        ..Default::default()
    };
    let report = run_batch_with(converter, &options).unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let broken = report
        .results
        .iter()
        .find(|r| r.input.ends_with("broken.md"))
        .unwrap();
    assert!(broken.error.as_deref().unwrap().contains("refused"));

    let pdf = fs::read(files[0].with_extension("pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(String::from_utf8_lossy(&pdf).contains("a4 2cm"));
    assert!(!dir.path().join("broken.pdf").exists());

    shutdown.notify_one();
}
