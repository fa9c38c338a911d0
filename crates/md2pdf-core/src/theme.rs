//! Theme discovery and stylesheet loading
//!
//! A theme is a CSS file styling `.markdown-body`. The four built-in themes
//! are compiled into the crate; `output.themes_dir` swaps them for a
//! directory of `*.css` files.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Config;

/// Built-in themes as `(name, css)`, sorted by name
pub const BUILTIN_THEMES: [(&str, &str); 4] = [
    ("academic", include_str!("../assets/themes/academic.css")),
    ("minimal", include_str!("../assets/themes/minimal.css")),
    ("modern", include_str!("../assets/themes/modern.css")),
    ("presentation", include_str!("../assets/themes/presentation.css")),
];

/// Errors raised while resolving themes
#[derive(Error, Debug)]
pub enum ThemeError {
    /// Configured theme directory is missing
    #[error("Themes directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Requested theme does not exist
    #[error("Theme '{name}' not found. Available themes: {}", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    /// Theme file could not be read
    #[error("Failed to read theme {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for theme operations
pub type Result<T> = std::result::Result<T, ThemeError>;

/// Where theme stylesheets are looked up
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ThemeSource {
    /// Themes compiled into the binary
    #[default]
    Builtin,
    /// `*.css` files in a directory
    Directory(PathBuf),
}

impl ThemeSource {
    /// Sorted names of all available themes
    pub fn list_themes(&self) -> Result<Vec<String>> {
        match self {
            ThemeSource::Builtin => Ok(BUILTIN_THEMES
                .iter()
                .map(|(name, _)| name.to_string())
                .collect()),
            ThemeSource::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(ThemeError::DirectoryNotFound(dir.clone()));
                }
                let entries = fs::read_dir(dir).map_err(|source| ThemeError::Io {
                    path: dir.clone(),
                    source,
                })?;

                let mut names: Vec<String> = entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_file() && path.extension().is_some_and(|ext| ext == "css")
                    })
                    .filter_map(|path| {
                        path.file_stem()
                            .map(|stem| stem.to_string_lossy().into_owned())
                    })
                    .collect();
                names.sort();
                Ok(names)
            }
        }
    }

    /// CSS content of a theme
    pub fn load_theme_css(&self, theme_name: &str) -> Result<String> {
        match self {
            ThemeSource::Builtin => BUILTIN_THEMES
                .iter()
                .find(|(name, _)| *name == theme_name)
                .map(|(_, css)| css.to_string())
                .ok_or_else(|| self.not_found(theme_name)),
            ThemeSource::Directory(dir) => {
                let path = dir.join(format!("{}.css", theme_name));
                // Reject names that would escape the directory
                let plain_name = !theme_name.is_empty()
                    && !theme_name.contains(['/', '\\'])
                    && theme_name != ".."
                    && theme_name != ".";
                if !plain_name || !path.is_file() {
                    return Err(self.not_found(theme_name));
                }
                fs::read_to_string(&path).map_err(|source| ThemeError::Io { path, source })
            }
        }
    }

    /// Fail unless the theme exists
    pub fn validate_theme(&self, theme_name: &str) -> Result<()> {
        let available = self.list_themes()?;
        if available.iter().any(|name| name == theme_name) {
            Ok(())
        } else {
            Err(ThemeError::NotFound {
                name: theme_name.to_string(),
                available,
            })
        }
    }

    fn not_found(&self, theme_name: &str) -> ThemeError {
        ThemeError::NotFound {
            name: theme_name.to_string(),
            available: self.list_themes().unwrap_or_default(),
        }
    }
}

/// Sorted names of the built-in themes
pub fn list_themes() -> Vec<String> {
    BUILTIN_THEMES
        .iter()
        .map(|(name, _)| name.to_string())
        .collect()
}

/// CSS content of a built-in theme
pub fn load_theme_css(theme_name: &str) -> Result<String> {
    ThemeSource::Builtin.load_theme_css(theme_name)
}

/// Theme lookups bound to a configuration
#[derive(Debug, Clone)]
pub struct ThemeManager<'a> {
    config: &'a Config,
    source: ThemeSource,
}

impl<'a> ThemeManager<'a> {
    /// Create a manager using the config's theme source
    pub fn new(config: &'a Config) -> Self {
        Self {
            source: config.theme_source(),
            config,
        }
    }

    /// The theme source in use
    pub fn source(&self) -> &ThemeSource {
        &self.source
    }

    /// Sorted names of all available themes
    pub fn list_themes(&self) -> Result<Vec<String>> {
        self.source.list_themes()
    }

    /// CSS content of a theme
    pub fn load_css(&self, theme_name: &str) -> Result<String> {
        self.source.load_theme_css(theme_name)
    }

    /// Fail unless the theme exists
    pub fn validate(&self, theme_name: &str) -> Result<()> {
        self.source.validate_theme(theme_name)
    }

    /// Mermaid diagram theme for a document theme
    pub fn mermaid_theme(&self, theme_name: &str) -> String {
        self.config
            .theme_config(theme_name)
            .mermaid_theme
            .unwrap_or_else(|| "default".to_string())
    }
}
