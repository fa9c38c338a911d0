//! Non-interactive batch conversion

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use md2pdf_core::{Config, OutputFormat};
use serde::Serialize;

use crate::convert::{validate_theme, ConversionResult, Converter};
use crate::files::resolve_files;

/// Where batch outputs are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputMode {
    /// Next to each input file
    #[default]
    SameDir,
    /// Into `--output-dir`
    Custom,
}

/// Batch request
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// File paths or glob patterns
    pub files: Vec<String>,
    /// Output format; the config default when `None`
    pub format: Option<OutputFormat>,
    /// Theme; the config default when `None`
    pub theme: Option<String>,
    pub output_mode: OutputMode,
    pub output_dir: Option<PathBuf>,
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<ConversionResult>,
}

impl BatchReport {
    pub fn new(results: Vec<ConversionResult>) -> Self {
        let success = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            success,
            failed: results.len() - success,
            results,
        }
    }

    /// True when every file converted
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable summary
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!("Converted {}/{} files", self.success, self.total)];
        for result in &self.results {
            let input = file_name(&result.input);
            match (&result.output, &result.error) {
                (Some(output), _) if result.success => {
                    lines.push(format!("  + {} -> {}", input, file_name(output)))
                }
                (_, error) => lines.push(format!(
                    "  x {} ({})",
                    input,
                    error.as_deref().unwrap_or("unknown error")
                )),
            }
        }
        lines.join("\n")
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validate the request, then convert every matching file
///
/// Errors returned here are fatal to the whole batch; per-file failures are
/// recorded in the report instead.
pub fn run_batch(config: &Config, options: &BatchOptions) -> Result<BatchReport> {
    let converter = Converter::new(
        config,
        options.format.unwrap_or(config.output.format),
        options
            .theme
            .clone()
            .unwrap_or_else(|| config.output.default_theme.clone()),
    );
    run_batch_with(converter, options)
}

/// [`run_batch`] with a prepared converter
pub fn run_batch_with(mut converter: Converter<'_>, options: &BatchOptions) -> Result<BatchReport> {
    validate_theme(converter.config(), converter.theme())?;

    let files = resolve_files(&options.files)?;

    let output_dir = match options.output_mode {
        OutputMode::SameDir => None,
        OutputMode::Custom => {
            let Some(dir) = options.output_dir.as_ref() else {
                bail!("--output-dir is required when --output-mode is custom");
            };
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
            Some(dir.as_path())
        }
    };

    tracing::info!(
        "Converting {} file(s) to {} with theme {}",
        files.len(),
        converter.format(),
        converter.theme()
    );

    Ok(BatchReport::new(converter.process_batch(&files, output_dir)))
}
