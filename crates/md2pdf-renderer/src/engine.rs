//! PDF engines
//!
//! The HTTP layer only knows the [`PdfEngine`] trait. [`ChromeEngine`] is the
//! production implementation: it prints pages with a shared headless Chrome.
//!
//! # Thread Safety
//!
//! Engines must be `Send + Sync`; renders run on tokio's blocking pool and
//! several may be in flight at once.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use md2pdf_core::{parse_length_inches, PdfOptions};

use crate::error::RenderError;

/// Selector present once the document's scripts have settled
pub const READY_SELECTOR: &str = "body[data-md2pdf-ready]";

/// Margin used for a side whose length does not parse
const FALLBACK_MARGIN_INCHES: f64 = 1.0;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Something that turns an HTML document into PDF bytes
pub trait PdfEngine: Send + Sync {
    /// Human-readable name of this engine
    fn name(&self) -> &'static str;

    /// Render a complete HTML document to PDF
    fn render_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>>;
}

/// Headless Chrome settings
#[derive(Debug, Clone)]
pub struct ChromeSettings {
    /// Chrome binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,
    /// Run Chrome with its sandbox enabled
    pub sandbox: bool,
    /// How long to wait for the readiness flag before printing anyway
    pub ready_timeout: Duration,
}

impl Default for ChromeSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: true,
            ready_timeout: Duration::from_secs(30),
        }
    }
}

/// PDF engine backed by one shared headless Chrome
///
/// The browser is launched on first use and relaunched after any failure.
pub struct ChromeEngine {
    settings: ChromeSettings,
    browser: Mutex<Option<Arc<Browser>>>,
}

impl ChromeEngine {
    pub fn new(settings: ChromeSettings) -> Self {
        Self {
            settings,
            browser: Mutex::new(None),
        }
    }

    /// Launch the browser ahead of the first request
    pub fn warm_up(&self) -> Result<()> {
        self.browser().map(|_| ())
    }

    fn browser(&self) -> Result<Arc<Browser>> {
        let mut slot = self
            .browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(browser) = slot.as_ref() {
            return Ok(Arc::clone(browser));
        }

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.settings.sandbox)
            .path(self.settings.chrome_path.clone())
            .idle_browser_timeout(Duration::from_secs(60 * 60 * 24))
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        let browser = Browser::new(options).map_err(|e| RenderError::Launch(e.to_string()))?;
        tracing::info!("Launched headless Chrome");

        let browser = Arc::new(browser);
        *slot = Some(Arc::clone(&browser));
        Ok(browser)
    }

    /// Drop the shared browser so the next render launches a fresh one
    fn reset(&self) {
        let mut slot = self
            .browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.take().is_some() {
            tracing::warn!("Discarding headless Chrome after failure");
        }
    }

    fn print(&self, browser: &Browser, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        let mut page = tempfile::Builder::new()
            .prefix("md2pdf-")
            .suffix(".html")
            .tempfile()?;
        page.write_all(html.as_bytes())?;
        page.flush()?;
        let url = format!("file://{}", page.path().display());

        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Page(e.to_string()))?;
        tab.navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| RenderError::Page(e.to_string()))?;

        if let Err(e) =
            tab.wait_for_element_with_custom_timeout(READY_SELECTOR, self.settings.ready_timeout)
        {
            tracing::warn!(
                "Page not ready after {:?} ({}); printing anyway",
                self.settings.ready_timeout,
                e
            );
        }

        let pdf = tab
            .print_to_pdf(Some(print_options(options)))
            .map_err(|e| RenderError::Print(e.to_string()));

        if let Err(e) = tab.close(true) {
            tracing::debug!("Failed to close tab: {}", e);
        }
        pdf
    }
}

impl Default for ChromeEngine {
    fn default() -> Self {
        Self::new(ChromeSettings::default())
    }
}

impl PdfEngine for ChromeEngine {
    fn name(&self) -> &'static str {
        "chrome"
    }

    fn render_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        let browser = self.browser()?;
        let result = self.print(&browser, html, options);
        if matches!(result, Err(RenderError::Page(_) | RenderError::Print(_))) {
            self.reset();
        }
        result
    }
}

/// Translate wire options into Chrome's print parameters
pub fn print_options(options: &PdfOptions) -> PrintToPdfOptions {
    let (width, height) = options.paper_size().dimensions_inches();
    let [top, bottom, left, right] = options
        .margin
        .sides()
        .map(|(_, value)| parse_length_inches(value).unwrap_or(FALLBACK_MARGIN_INCHES));

    PrintToPdfOptions {
        landscape: Some(options.landscape),
        print_background: Some(options.print_background),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(top),
        margin_bottom: Some(bottom),
        margin_left: Some(left),
        margin_right: Some(right),
        prefer_css_page_size: Some(true),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md2pdf_core::Margins;

    #[test]
    fn test_print_options_defaults() {
        let print = print_options(&PdfOptions::default());
        assert_eq!(print.paper_width, Some(8.5));
        assert_eq!(print.paper_height, Some(11.0));
        assert_eq!(print.margin_top, Some(1.0));
        assert_eq!(print.print_background, Some(true));
        assert_eq!(print.landscape, Some(false));
        assert_eq!(print.prefer_css_page_size, Some(true));
    }

    #[test]
    fn test_print_options_margins() {
        let options = PdfOptions {
            format: "a4".to_string(),
            landscape: true,
            margin: Margins {
                top: "2.54cm".to_string(),
                bottom: "72pt".to_string(),
                left: "bogus".to_string(),
                right: "0.5in".to_string(),
            },
            ..Default::default()
        };
        let print = print_options(&options);

        assert!((print.margin_top.unwrap() - 1.0).abs() < 1e-9);
        assert!((print.margin_bottom.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(print.margin_left, Some(1.0));
        assert_eq!(print.margin_right, Some(0.5));
        assert_eq!(print.landscape, Some(true));
        assert!((print.paper_width.unwrap() - 8.27).abs() < 0.01);
    }

    #[test]
    #[ignore = "requires a local Chrome installation"]
    fn test_chrome_renders_pdf() {
        let engine = ChromeEngine::new(ChromeSettings {
            ready_timeout: Duration::from_secs(5),
            ..Default::default()
        });
        let html = "<html><body data-md2pdf-ready=\"true\"><h1>Hi</h1></body></html>";
        let pdf = engine.render_pdf(html, &PdfOptions::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }
}
