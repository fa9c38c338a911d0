//! Markdown to HTML rendering
//!
//! Rendering is delegated to the [`markdown`] crate (CommonMark compliant)
//! with GFM tables switched on and raw HTML passed through untouched.

use std::sync::OnceLock;

use regex::Regex;

/// Title used when a document has no level-1 heading
pub const UNTITLED: &str = "Untitled Document";

fn options() -> markdown::Options {
    markdown::Options {
        parse: markdown::ParseOptions {
            constructs: markdown::Constructs {
                gfm_table: true,
                ..markdown::Constructs::default()
            },
            ..markdown::ParseOptions::default()
        },
        compile: markdown::CompileOptions {
            allow_dangerous_html: true,
            ..markdown::CompileOptions::default()
        },
    }
}

fn title_regex() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| Regex::new(r"(?m)^#[ \t]+(.*?)[ \t]*$").expect("title pattern is valid"))
}

/// Render Markdown content to an HTML fragment
///
/// # Example
///
/// ```
/// use md2pdf_core::render_markdown;
///
/// let html = render_markdown("# Hello\n\nWorld");
/// assert!(html.contains("<h1>Hello</h1>"));
/// assert!(html.contains("<p>World</p>"));
/// ```
pub fn render_markdown(md_content: &str) -> String {
    if md_content.is_empty() {
        return String::new();
    }

    match markdown::to_html_with_options(md_content, &options()) {
        Ok(html) => html,
        Err(message) => {
            // Plain CommonMark cannot fail, so this only guards option changes
            tracing::warn!("Markdown rendering with extensions failed: {}", message);
            markdown::to_html(md_content)
        }
    }
}

/// Extract the document title from the first level-1 heading
///
/// Headings are matched line by line, and a `#` line with nothing but
/// whitespace after it is an empty heading that gets skipped, so the
/// first H1 with text wins. Returns [`UNTITLED`] when there is none.
///
/// ```
/// use md2pdf_core::extract_title;
///
/// assert_eq!(extract_title("## Not an H1\n\n# This is H1"), "This is H1");
/// assert_eq!(extract_title("Just plain text"), "Untitled Document");
/// ```
pub fn extract_title(md_content: &str) -> String {
    title_regex()
        .captures_iter(md_content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|title| !title.is_empty())
        .map_or_else(|| UNTITLED.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let html = render_markdown("# Hello\n\nWorld");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn test_render_code_block() {
        let md = "```python\nprint('hello')\n```";
        let html = render_markdown(md);

        assert!(html.contains("<pre>"));
        assert!(html.contains("<code class=\"language-python\">"));
        assert!(html.contains("print("));
    }

    #[test]
    fn test_render_lists() {
        let html = render_markdown("- Item 1\n- Item 2\n- Item 3");

        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>Item 1</li>"));
        assert!(html.contains("<li>Item 2</li>"));
    }

    #[test]
    fn test_render_table() {
        let md = "| A | B |\n|---|---|\n| 1 | 2 |";
        let html = render_markdown(md);

        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_render_raw_html_passthrough() {
        let html = render_markdown("<div class=\"note\">kept</div>");
        assert!(html.contains("<div class=\"note\">kept</div>"));
    }

    #[test]
    fn test_render_mermaid_fence_keeps_language() {
        let html = render_markdown("```mermaid\ngraph TD; A-->B;\n```");
        assert!(html.contains("language-mermaid"));
    }

    #[test]
    fn test_extract_title_from_first_heading() {
        assert_eq!(extract_title("# My Title\n\nSome content"), "My Title");
    }

    #[test]
    fn test_extract_title_skips_lower_levels() {
        assert_eq!(extract_title("## Not an H1\n\n# This is H1"), "This is H1");
    }

    #[test]
    fn test_extract_title_trims() {
        assert_eq!(extract_title("#   Spaced Out   \n"), "Spaced Out");
    }

    #[test]
    fn test_extract_title_default() {
        assert_eq!(extract_title("Just some content without headings"), UNTITLED);
        assert_eq!(extract_title(""), UNTITLED);
    }

    #[test]
    fn test_extract_title_skips_empty_heading() {
        assert_eq!(extract_title("#  \n# Real\n"), "Real");
        assert_eq!(extract_title("#\t\n\nBody"), UNTITLED);
    }

    #[test]
    fn test_extract_title_stays_on_one_line() {
        assert_eq!(extract_title("# \nBody text"), UNTITLED);
    }

    #[test]
    fn test_extract_title_requires_space() {
        assert_eq!(extract_title("#hashtag\n"), UNTITLED);
    }
}
