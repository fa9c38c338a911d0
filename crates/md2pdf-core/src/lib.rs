//! md2pdf-core - Markdown to styled documents
//!
//! Core library for md2pdf, providing everything needed to turn Markdown
//! into a self-contained, themed HTML document ready for printing.
//!
//! # Example
//!
//! ```
//! use md2pdf_core::{build_html_document, Config};
//!
//! let config = Config::default();
//! let html = build_html_document("# Hello\n\nWorld", "academic", &config)?;
//!
//! assert!(html.contains("<title>Hello</title>"));
//! assert!(html.contains("<p>World</p>"));
//! # Ok::<(), md2pdf_core::DocumentError>(())
//! ```

pub mod config;
pub mod document;
pub mod markdown;
pub mod pdf;
pub mod theme;

// Re-export main types and functions
pub use config::{
    load_config, load_config_in, Config, ConfigError, OutputFormat, OutputSettings, PdfSettings,
    RendererSettings, RenderingSettings, ThemeConfig,
};
pub use document::{build_html_document, DocumentError};
pub use markdown::{extract_title, render_markdown, UNTITLED};
pub use pdf::{parse_length_inches, Margins, PaperSize, PdfOptions};
pub use theme::{
    list_themes, load_theme_css, ThemeError, ThemeManager, ThemeSource, BUILTIN_THEMES,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }
}
