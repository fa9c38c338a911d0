//! HTML document builder
//!
//! Wraps rendered Markdown in a complete, self-contained HTML page: theme
//! CSS inlined, Mermaid/KaTeX/highlight.js wired up, and a readiness flag
//! (`data-md2pdf-ready` on `<body>`) the renderer waits for before printing.

use handlebars::Handlebars;
use serde_json::json;
use thiserror::Error;

use crate::config::Config;
use crate::markdown::{extract_title, render_markdown};
use crate::theme::{ThemeError, ThemeManager};

const BASE_TEMPLATE: &str = include_str!("../assets/templates/base.html");
const BASE_TEMPLATE_NAME: &str = "base";

const KATEX_HEAD: &str = r#"  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/katex@0.16/dist/katex.min.css">"#;

const KATEX_SCRIPT: &str = r#"    tasks.push(
      import('https://cdn.jsdelivr.net/npm/katex@0.16/dist/contrib/auto-render.mjs').then(({ default: renderMathInElement }) => {
        renderMathInElement(document.querySelector('.markdown-body'), {
          delimiters: [
            { left: '$$', right: '$$', display: true },
            { left: '$', right: '$', display: false },
            { left: '\\(', right: '\\)', display: false },
            { left: '\\[', right: '\\]', display: true }
          ],
          throwOnError: false
        });
      })
    );
"#;

const HIGHLIGHT_SCRIPT: &str = r#"    tasks.push(
      import('https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@11/build/es/highlight.min.js').then(({ default: hljs }) => {
        document.querySelectorAll('pre > code[class^="language-"]').forEach((block) => hljs.highlightElement(block));
      })
    );
"#;

/// Errors raised while building a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Theme could not be resolved
    #[error(transparent)]
    Theme(#[from] ThemeError),

    /// The page template failed to parse
    #[error("Invalid page template: {0}")]
    TemplateSyntax(#[from] Box<handlebars::TemplateError>),

    /// The page template failed to render
    #[error("Page template rendering failed: {0}")]
    Template(#[from] handlebars::RenderError),
}

/// Result type for document building
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Build a complete HTML document from Markdown
///
/// # Arguments
/// * `md_content` - Markdown source
/// * `theme_name` - Theme to inline (e.g. `academic`)
/// * `config` - Configuration supplying theme source and rendering options
pub fn build_html_document(md_content: &str, theme_name: &str, config: &Config) -> Result<String> {
    let themes = ThemeManager::new(config);

    let title = extract_title(md_content);
    let content = render_markdown(md_content);
    let theme_css = themes.load_css(theme_name)?;
    let mermaid_theme = sanitize_identifier(&themes.mermaid_theme(theme_name));

    tracing::debug!(
        "Building document '{}' with theme {} (mermaid: {})",
        title,
        theme_name,
        mermaid_theme
    );

    let mut head_assets = Vec::new();
    let mut body_scripts = String::new();

    if config.math_enabled() {
        head_assets.push(KATEX_HEAD.to_string());
        body_scripts.push_str(KATEX_SCRIPT);
    }
    if config.rendering.syntax_highlighting {
        let style = sanitize_identifier(&config.rendering.code_theme);
        head_assets.push(format!(
            r#"  <link rel="stylesheet" href="https://cdn.jsdelivr.net/gh/highlightjs/cdn-release@11/build/styles/{}.min.css">"#,
            style
        ));
        body_scripts.push_str(HIGHLIGHT_SCRIPT);
    }

    let context = json!({
        "version": crate::VERSION,
        "title": title,
        "head_assets": head_assets.join("\n"),
        "theme_css": theme_css,
        "content": content,
        "mermaid_theme": mermaid_theme,
        "body_scripts": body_scripts,
    });

    Ok(page_templates()?.render(BASE_TEMPLATE_NAME, &context)?)
}

/// Registry holding the page template
///
/// Strict mode turns a placeholder with no value into a render error
/// instead of an empty string.
fn page_templates() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars
        .register_template_string(BASE_TEMPLATE_NAME, BASE_TEMPLATE)
        .map_err(Box::new)?;
    Ok(handlebars)
}

/// Keep values spliced into JS strings and URLs to `[A-Za-z0-9_-]`
fn sanitize_identifier(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
