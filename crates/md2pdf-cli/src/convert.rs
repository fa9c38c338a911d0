//! Markdown conversion pipeline shared by the interactive and batch modes

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use md2pdf_client::RendererClient;
use md2pdf_core::{build_html_document, Config, OutputFormat, ThemeError, ThemeManager};
use serde::Serialize;

/// Outcome of converting one file
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub success: bool,
    pub error: Option<String>,
}

impl ConversionResult {
    fn ok(input: &Path, output: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: Some(output.to_path_buf()),
            success: true,
            error: None,
        }
    }

    fn failed(input: &Path, error: String) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            success: false,
            error: Some(error),
        }
    }
}

/// `<dir>/<stem>.<ext>`, where `dir` defaults to the input's directory
pub fn output_path(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));
    dir.join(format!("{}.{}", stem, format.extension()))
}

/// Fail unless the theme exists in the configured theme source
pub fn validate_theme(config: &Config, theme: &str) -> Result<()> {
    match ThemeManager::new(config).validate(theme) {
        Ok(()) => Ok(()),
        Err(ThemeError::NotFound { name, available }) => bail!(
            "Theme '{}' not found. Available: {}",
            name,
            available.join(", ")
        ),
        Err(e) => Err(e.into()),
    }
}

/// Converts Markdown files with one format and theme
///
/// PDF output goes through a single renderer that is started on the first
/// PDF file and stopped when the converter is dropped.
pub struct Converter<'a> {
    config: &'a Config,
    format: OutputFormat,
    theme: String,
    renderer: Option<RendererClient>,
    renderer_error: Option<String>,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a Config, format: OutputFormat, theme: impl Into<String>) -> Self {
        Self {
            config,
            format,
            theme: theme.into(),
            renderer: None,
            renderer_error: None,
        }
    }

    /// Use an existing renderer client instead of starting one
    pub fn with_renderer(mut self, client: RendererClient) -> Self {
        self.renderer = Some(client);
        self
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Convert one file to an explicit output path
    pub fn convert_file(&mut self, input: &Path, output: &Path) -> ConversionResult {
        match self.convert(input, output) {
            Ok(()) => {
                tracing::info!("Converted {} -> {}", input.display(), output.display());
                ConversionResult::ok(input, output)
            }
            Err(e) => {
                tracing::warn!("Failed to convert {}: {:#}", input.display(), e);
                ConversionResult::failed(input, format!("{:#}", e))
            }
        }
    }

    /// Convert files in order, continuing past failures
    ///
    /// Outputs go to `output_dir`, or next to each input when `None`.
    pub fn process_batch(
        &mut self,
        files: &[PathBuf],
        output_dir: Option<&Path>,
    ) -> Vec<ConversionResult> {
        files
            .iter()
            .map(|input| {
                let output = output_path(input, output_dir, self.format);
                self.convert_file(input, &output)
            })
            .collect()
    }

    fn convert(&mut self, input: &Path, output: &Path) -> Result<()> {
        let markdown = fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let html = build_html_document(&markdown, &self.theme, self.config)?;

        match self.format {
            OutputFormat::Html => fs::write(output, html)
                .with_context(|| format!("Failed to write {}", output.display()))?,
            OutputFormat::Pdf => {
                let options = self.config.pdf_render_options();
                let pdf = self.renderer()?.render_pdf(&html, Some(&options))?;
                fs::write(output, pdf)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
            }
        }

        Ok(())
    }

    /// The shared renderer, started on first use
    ///
    /// A failed start is remembered so later files fail fast.
    fn renderer(&mut self) -> Result<&RendererClient> {
        if let Some(error) = &self.renderer_error {
            return Err(anyhow!("{}", error));
        }

        if self.renderer.is_none() {
            let started = RendererClient::from_config(&self.config.renderer).and_then(|mut client| {
                client.start_server()?;
                Ok(client)
            });
            let client = match started {
                Ok(client) => client,
                Err(e) => {
                    let message = e.to_string();
                    self.renderer_error = Some(message.clone());
                    return Err(anyhow!("{}", message));
                }
            };
            self.renderer = Some(client);
        }

        self.renderer
            .as_ref()
            .ok_or_else(|| anyhow!("Renderer unavailable"))
    }
}
