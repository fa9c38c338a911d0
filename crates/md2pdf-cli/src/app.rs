//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use md2pdf_core::{load_config, Config, OutputFormat, ThemeManager};

use crate::batch::{run_batch, BatchOptions, OutputMode};
use crate::interactive::{run_interactive, Prompter, BANNER};

/// Output format argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// PDF via the renderer service
    Pdf,
    /// Self-contained HTML
    Html,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Html => OutputFormat::Html,
        }
    }
}

#[derive(Parser)]
#[command(name = "md2pdf")]
#[command(author, version, about = "Markdown to themed PDF and HTML", long_about = None)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose files, format and theme through prompts (default)
    Interactive,

    /// Convert files without prompting
    Batch {
        /// File paths or glob patterns
        #[arg(long, required = true, num_args = 1..)]
        files: Vec<String>,

        /// Output format (defaults to the configured format)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Theme name (defaults to the configured theme)
        #[arg(long)]
        theme: Option<String>,

        /// Where to write outputs
        #[arg(long, value_enum, default_value = "same-dir")]
        output_mode: OutputMode,

        /// Output directory for `--output-mode custom`
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json_output: bool,
    },

    /// List available themes
    Themes,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => interactive_command(cli.config.as_deref())?,
        Commands::Batch {
            files,
            format,
            theme,
            output_mode,
            output_dir,
            json_output,
        } => {
            let options = BatchOptions {
                files,
                format: format.map(Into::into),
                theme,
                output_mode,
                output_dir,
            };
            batch_command(cli.config.as_deref(), &options, json_output)?;
        }
        Commands::Themes => themes_command(cli.config.as_deref())?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// `RUST_LOG` wins when set and valid, otherwise `--verbose` picks the level
fn env_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

/// Load and validate the configuration
pub fn load_checked_config(path: Option<&Path>) -> Result<Config> {
    let config = load_config(path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Execute the interactive command
pub fn interactive_command(config_path: Option<&Path>) -> Result<()> {
    println!("{}\n", BANNER);

    let config = load_checked_config(config_path)?;

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let results = run_interactive(&config, &mut prompter)?;

    if results.iter().any(|r| !r.success) {
        std::process::exit(1);
    }
    Ok(())
}

/// Execute the batch command
///
/// Exits with status 1 unless every file converted. Fatal errors are
/// printed as `{"error": ...}` with `--json-output`.
pub fn batch_command(
    config_path: Option<&Path>,
    options: &BatchOptions,
    json_output: bool,
) -> Result<()> {
    let outcome = load_checked_config(config_path).and_then(|config| run_batch(&config, options));

    match outcome {
        Ok(report) => {
            if json_output {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize batch report to JSON")?;
                println!("{}", json);
            } else {
                println!("{}", report.to_text());
            }
            if !report.all_succeeded() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            if json_output {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("Error: {:#}", e);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Execute the themes command
pub fn themes_command(config_path: Option<&Path>) -> Result<()> {
    let config = load_checked_config(config_path)?;
    let manager = ThemeManager::new(&config);
    let themes = manager.list_themes().context("Failed to list themes")?;

    println!("Available themes:");
    for theme in &themes {
        let marker = if *theme == config.output.default_theme {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<14} mermaid: {}{}",
            theme,
            manager.mermaid_theme(theme),
            marker
        );
    }

    Ok(())
}
