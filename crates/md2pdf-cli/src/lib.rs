//! md2pdf CLI - Command-line interface library
//!
//! This library provides the CLI functionality for md2pdf:
//! - Interactive: prompt for files, format and theme
//! - Batch: convert files and glob patterns without prompting
//! - Themes: list available themes
//!
//! # Library Usage
//!
//! ```ignore
//! use md2pdf_cli::{run_batch, BatchOptions};
//! use md2pdf_core::{Config, OutputFormat};
//!
//! let options = BatchOptions {
//!     files: vec!["docs/**/*.md".to_string()],
//!     format: Some(OutputFormat::Html),
//!     ..Default::default()
//! };
//! let report = run_batch(&Config::default(), &options)?;
//! println!("{}", report.to_text());
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Prompt for everything
//! md2pdf
//!
//! # Convert a folder to PDF with the modern theme
//! md2pdf batch --files "docs/*.md" --theme modern
//!
//! # HTML into a separate directory, JSON report
//! md2pdf batch --files README.md --format html --output-mode custom --output-dir site --json-output
//! ```

pub mod app;
pub mod batch;
pub mod convert;
pub mod files;
pub mod interactive;

// Re-export main entry point and types
pub use app::{
    batch_command, interactive_command, load_checked_config, run_cli, themes_command, FormatArg,
};
pub use batch::{run_batch, run_batch_with, BatchOptions, BatchReport, OutputMode};
pub use convert::{output_path, validate_theme, ConversionResult, Converter};
pub use files::{expand_selection, glob_files, resolve_files};
pub use interactive::{run_interactive, Prompter};
