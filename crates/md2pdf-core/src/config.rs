//! Configuration loading (`md2pdf.config.yaml`)
//!
//! Every section and key is optional; anything missing takes the value from
//! the built-in defaults, so a file containing only
//!
//! ```yaml
//! output:
//!   format: html
//! ```
//!
//! is a complete configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pdf::{parse_length_inches, Margins, PaperSize, PdfOptions};
use crate::theme::ThemeSource;

/// Built-in configuration, identical to [`Config::default`]
pub const DEFAULT_CONFIG_YAML: &str = include_str!("../assets/md2pdf.config.yaml");

/// File names searched in the working directory when no path is given
pub const CONFIG_CANDIDATES: [&str; 2] = ["md2pdf.config.yaml", ".md2pdf.config.yaml"];

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Explicit config path does not exist
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Config file could not be read
    #[error("Failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for this schema
    #[error("Invalid configuration {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Config parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Html,
}

impl OutputFormat {
    /// File extension (without the dot)
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "html" => Ok(OutputFormat::Html),
            other => Err(format!("unknown output format '{}' (expected pdf or html)", other)),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputSettings,
    pub pdf_options: PdfSettings,
    pub rendering: RenderingSettings,
    pub themes: BTreeMap<String, ThemeConfig>,
    pub renderer: RendererSettings,
}

impl Default for Config {
    fn default() -> Self {
        let themes = [
            ("academic", "default"),
            ("minimal", "neutral"),
            ("modern", "forest"),
            ("presentation", "dark"),
        ]
        .into_iter()
        .map(|(name, mermaid)| {
            (
                name.to_string(),
                ThemeConfig {
                    mermaid_theme: Some(mermaid.to_string()),
                },
            )
        })
        .collect();

        Self {
            output: OutputSettings::default(),
            pdf_options: PdfSettings::default(),
            rendering: RenderingSettings::default(),
            themes,
            renderer: RendererSettings::default(),
        }
    }
}

/// `output` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Default output format
    pub format: OutputFormat,
    /// Theme used when none is chosen
    pub default_theme: String,
    /// Directory of `*.css` themes replacing the built-in set
    pub themes_dir: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pdf,
            default_theme: "academic".to_string(),
            themes_dir: None,
        }
    }
}

/// `pdf_options` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    pub page_size: String,
    pub print_background: bool,
    pub landscape: bool,
    pub margins: Margins,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            page_size: "letter".to_string(),
            print_background: true,
            landscape: false,
            margins: Margins::default(),
        }
    }
}

/// `rendering` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingSettings {
    /// Mermaid theme for themes without their own entry
    pub mermaid_theme: String,
    /// `katex` enables math rendering, anything else disables it
    pub math_engine: String,
    pub syntax_highlighting: bool,
    /// highlight.js style name
    pub code_theme: String,
}

impl Default for RenderingSettings {
    fn default() -> Self {
        Self {
            mermaid_theme: "default".to_string(),
            math_engine: "katex".to_string(),
            syntax_highlighting: true,
            code_theme: "github".to_string(),
        }
    }
}

/// Per-theme settings (`themes.<name>`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub mermaid_theme: Option<String>,
}

/// `renderer` section: how the CLI reaches the rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub port: u16,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Health checks before giving up on a freshly started server
    pub startup_retries: u32,
    pub retry_delay_ms: u64,
    /// Explicit renderer binary; discovered automatically when unset
    pub server_path: Option<PathBuf>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            timeout_secs: 60,
            startup_retries: 10,
            retry_delay_ms: 500,
            server_path: None,
        }
    }
}

impl Config {
    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Check values that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.output.default_theme.trim().is_empty() {
            problems.push("output.default_theme must not be empty".to_string());
        }
        if PaperSize::from_name(&self.pdf_options.page_size).is_none() {
            let known: Vec<&str> = PaperSize::ALL.iter().map(|s| s.name()).collect();
            problems.push(format!(
                "pdf_options.page_size '{}' is not one of {}",
                self.pdf_options.page_size,
                known.join(", ")
            ));
        }
        for (side, value) in self.pdf_options.margins.sides() {
            if parse_length_inches(value).is_none() {
                problems.push(format!(
                    "pdf_options.margins.{} '{}' is not a valid length",
                    side, value
                ));
            }
        }
        if self.renderer.port == 0 {
            problems.push("renderer.port must not be 0".to_string());
        }
        if self.renderer.timeout_secs == 0 {
            problems.push("renderer.timeout_secs must not be 0".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    /// Settings for a theme, falling back to the global Mermaid theme
    pub fn theme_config(&self, theme_name: &str) -> ThemeConfig {
        let mermaid_theme = self
            .themes
            .get(theme_name)
            .and_then(|t| t.mermaid_theme.clone())
            .unwrap_or_else(|| self.rendering.mermaid_theme.clone());

        ThemeConfig {
            mermaid_theme: Some(mermaid_theme),
        }
    }

    /// Where theme stylesheets come from
    pub fn theme_source(&self) -> ThemeSource {
        match &self.output.themes_dir {
            Some(dir) => ThemeSource::Directory(dir.clone()),
            None => ThemeSource::Builtin,
        }
    }

    /// Wire options for a PDF render request
    pub fn pdf_render_options(&self) -> PdfOptions {
        PdfOptions {
            format: self.pdf_options.page_size.clone(),
            print_background: self.pdf_options.print_background,
            landscape: self.pdf_options.landscape,
            margin: self.pdf_options.margins.clone(),
        }
    }

    /// Math rendering enabled
    pub fn math_enabled(&self) -> bool {
        self.rendering.math_engine.eq_ignore_ascii_case("katex")
    }
}

/// Load configuration from a YAML file
///
/// With `None`, the working directory is searched for
/// [`CONFIG_CANDIDATES`] and the built-in defaults are used when none exist.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    load_config_in(Path::new(""), config_path)
}

/// Load configuration, discovering [`CONFIG_CANDIDATES`] inside `dir`
///
/// An explicit `config_path` is used as given. Candidates are tried in
/// order, so `md2pdf.config.yaml` wins over `.md2pdf.config.yaml`.
pub fn load_config_in(dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        return load_file(path);
    }

    for candidate in CONFIG_CANDIDATES {
        let path = dir.join(candidate);
        if path.is_file() {
            tracing::debug!("Using configuration {}", path.display());
            return load_file(&path);
        }
    }

    tracing::debug!("No configuration file found, using built-in defaults");
    Ok(Config::default())
}

fn load_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = Config::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    // Relative theme directories are relative to the config file
    if let Some(dir) = config.output.themes_dir.as_mut() {
        if dir.is_relative() {
            if let Some(parent) = path.parent() {
                *dir = parent.join(&*dir);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_yaml_matches_default() {
        let parsed = Config::from_yaml_str(DEFAULT_CONFIG_YAML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.output.format, OutputFormat::Pdf);
        assert_eq!(config.output.default_theme, "academic");
        assert_eq!(config.renderer.port, 3000);
        assert_eq!(config.renderer.timeout_secs, 60);
        assert_eq!(config.themes.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml_str("output:\n  format: html\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Html);
        assert_eq!(config.output.default_theme, "academic");
        assert_eq!(config.pdf_options.page_size, "letter");
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(Config::from_yaml_str("output:\n  format: docx\n").is_err());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = Config::default();
        config.output.default_theme = String::new();
        config.pdf_options.page_size = "napkin".to_string();
        config.pdf_options.margins.left = "auto".to_string();
        config.renderer.port = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_theme"));
        assert!(err.contains("napkin"));
        assert!(err.contains("margins.left"));
        assert!(err.contains("renderer.port"));
    }

    #[test]
    fn test_theme_config_configured() {
        let config = Config::default();
        assert_eq!(
            config.theme_config("modern").mermaid_theme.as_deref(),
            Some("forest")
        );
    }

    #[test]
    fn test_theme_config_falls_back_to_rendering() {
        let mut config = Config::default();
        config.rendering.mermaid_theme = "base".to_string();
        assert_eq!(
            config.theme_config("unknown").mermaid_theme.as_deref(),
            Some("base")
        );
    }

    #[test]
    fn test_pdf_render_options() {
        let yaml = r#"
pdf_options:
  page_size: a4
  print_background: false
  margins:
    top: 2cm
    bottom: 2cm
    left: 2cm
    right: 2cm
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        let options = config.pdf_render_options();
        assert_eq!(options.format, "a4");
        assert!(!options.print_background);
        assert_eq!(options.margin, Margins::uniform("2cm"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("PDF".parse::<OutputFormat>(), Ok(OutputFormat::Pdf));
        assert_eq!("html".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert!("docx".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Html.extension(), "html");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/md2pdf.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_config_custom_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "output:\n  format: html\n  themes_dir: styles\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.format, OutputFormat::Html);
        assert_eq!(config.output.themes_dir, Some(dir.path().join("styles")));
    }

    #[test]
    fn test_load_config_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "output: [unclosed\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_discovery_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("md2pdf.config.yaml"), "output:\n  format: html\n").unwrap();
        fs::write(
            dir.path().join(".md2pdf.config.yaml"),
            "output:\n  format: pdf\n  default_theme: modern\n",
        )
        .unwrap();

        let config = load_config_in(dir.path(), None).unwrap();
        assert_eq!(config.output.format, OutputFormat::Html);
        assert_eq!(config.output.default_theme, "academic");
    }

    #[test]
    fn test_discovery_finds_hidden_candidate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".md2pdf.config.yaml"),
            "output:\n  default_theme: modern\n  themes_dir: styles\n",
        )
        .unwrap();

        let config = load_config_in(dir.path(), None).unwrap();
        assert_eq!(config.output.default_theme, "modern");
        assert_eq!(config.output.themes_dir, Some(dir.path().join("styles")));
    }

    #[test]
    fn test_discovery_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_in(dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_path_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("md2pdf.config.yaml"), "output:\n  format: html\n").unwrap();
        let custom = dir.path().join("custom.yaml");
        fs::write(&custom, "output:\n  default_theme: minimal\n").unwrap();

        let config = load_config_in(dir.path(), Some(&custom)).unwrap();
        assert_eq!(config.output.format, OutputFormat::Pdf);
        assert_eq!(config.output.default_theme, "minimal");
    }
}
