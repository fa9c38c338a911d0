//! PDF rendering options
//!
//! These types travel over the wire between the renderer client and the
//! renderer service, using the camelCase names browsers' print APIs use.

use serde::{Deserialize, Serialize};

/// Default page margin on every side
pub const DEFAULT_MARGIN: &str = "1in";

/// Page format and print settings sent with a render request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfOptions {
    /// Paper size name (letter, a4, ...)
    pub format: String,
    /// Print CSS backgrounds
    pub print_background: bool,
    /// Landscape orientation
    pub landscape: bool,
    /// Page margins as CSS lengths
    pub margin: Margins,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: "letter".to_string(),
            print_background: true,
            landscape: false,
            margin: Margins::default(),
        }
    }
}

impl PdfOptions {
    /// Resolve the paper size, falling back to letter for unknown names
    pub fn paper_size(&self) -> PaperSize {
        PaperSize::from_name(&self.format).unwrap_or(PaperSize::Letter)
    }
}

/// Page margins, each a CSS length such as `1in` or `2cm`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: String,
    pub bottom: String,
    pub left: String,
    pub right: String,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

impl Margins {
    /// Same margin on all four sides
    pub fn uniform(length: impl Into<String>) -> Self {
        let length = length.into();
        Self {
            top: length.clone(),
            bottom: length.clone(),
            left: length.clone(),
            right: length,
        }
    }

    /// Margins in inches as `[top, bottom, left, right]`
    ///
    /// Returns `None` if any side is not a valid length.
    pub fn to_inches(&self) -> Option<[f64; 4]> {
        Some([
            parse_length_inches(&self.top)?,
            parse_length_inches(&self.bottom)?,
            parse_length_inches(&self.left)?,
            parse_length_inches(&self.right)?,
        ])
    }

    /// Iterate over `(side, value)` pairs
    pub fn sides(&self) -> [(&'static str, &str); 4] {
        [
            ("top", &self.top),
            ("bottom", &self.bottom),
            ("left", &self.left),
            ("right", &self.right),
        ]
    }
}

/// Supported paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    Letter,
    Legal,
    Tabloid,
    A3,
    A4,
    A5,
}

impl PaperSize {
    /// All sizes, in display order
    pub const ALL: [PaperSize; 6] = [
        PaperSize::Letter,
        PaperSize::Legal,
        PaperSize::Tabloid,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
    ];

    /// Look up a paper size by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "letter" => Some(PaperSize::Letter),
            "legal" => Some(PaperSize::Legal),
            "tabloid" => Some(PaperSize::Tabloid),
            "a3" => Some(PaperSize::A3),
            "a4" => Some(PaperSize::A4),
            "a5" => Some(PaperSize::A5),
            _ => None,
        }
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::Tabloid => "tabloid",
            PaperSize::A3 => "a3",
            PaperSize::A4 => "a4",
            PaperSize::A5 => "a5",
        }
    }

    /// Portrait `(width, height)` in inches
    pub fn dimensions_inches(self) -> (f64, f64) {
        match self {
            PaperSize::Letter => (8.5, 11.0),
            PaperSize::Legal => (8.5, 14.0),
            PaperSize::Tabloid => (11.0, 17.0),
            PaperSize::A3 => (11.69, 16.54),
            PaperSize::A4 => (8.27, 11.69),
            PaperSize::A5 => (5.83, 8.27),
        }
    }
}

impl std::fmt::Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a CSS length into inches
///
/// Accepts `in`, `cm`, `mm`, `px` (96 per inch) and `pt` (72 per inch).
/// A bare number is taken as pixels.
///
/// ```
/// use md2pdf_core::parse_length_inches;
///
/// assert_eq!(parse_length_inches("1in"), Some(1.0));
/// assert_eq!(parse_length_inches("96px"), Some(1.0));
/// assert_eq!(parse_length_inches("wide"), None);
/// ```
pub fn parse_length_inches(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let number: f64 = number.parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }

    let inches = match unit.trim() {
        "in" => number,
        "cm" => number / 2.54,
        "mm" => number / 25.4,
        "pt" => number / 72.0,
        "px" | "" => number / 96.0,
        _ => return None,
    };

    Some(inches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PdfOptions::default();
        assert_eq!(options.format, "letter");
        assert!(options.print_background);
        assert!(!options.landscape);
        assert_eq!(options.margin, Margins::uniform("1in"));
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let json = serde_json::to_value(PdfOptions::default()).unwrap();
        assert_eq!(json["printBackground"], true);
        assert_eq!(json["margin"]["top"], "1in");
        assert!(json.get("print_background").is_none());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let options: PdfOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PdfOptions::default());
    }

    #[test]
    fn test_partial_margin() {
        let options: PdfOptions =
            serde_json::from_str(r#"{"format": "A4", "margin": {"top": "2cm"}}"#).unwrap();
        assert_eq!(options.paper_size(), PaperSize::A4);
        assert_eq!(options.margin.top, "2cm");
        assert_eq!(options.margin.bottom, "1in");
    }

    #[test]
    fn test_unknown_format_falls_back_to_letter() {
        let options = PdfOptions {
            format: "napkin".to_string(),
            ..PdfOptions::default()
        };
        assert_eq!(options.paper_size(), PaperSize::Letter);
    }

    #[test]
    fn test_paper_size_lookup() {
        assert_eq!(PaperSize::from_name("Letter"), Some(PaperSize::Letter));
        assert_eq!(PaperSize::from_name(" a4 "), Some(PaperSize::A4));
        assert_eq!(PaperSize::from_name("b5"), None);
        for size in PaperSize::ALL {
            assert_eq!(PaperSize::from_name(size.name()), Some(size));
        }
    }

    #[test]
    fn test_parse_lengths() {
        assert_eq!(parse_length_inches("1in"), Some(1.0));
        assert_eq!(parse_length_inches("2.54cm"), Some(1.0));
        assert_eq!(parse_length_inches("25.4mm"), Some(1.0));
        assert_eq!(parse_length_inches("72pt"), Some(1.0));
        assert_eq!(parse_length_inches("48px"), Some(0.5));
        assert_eq!(parse_length_inches("192"), Some(2.0));
        assert_eq!(parse_length_inches("0"), Some(0.0));
    }

    #[test]
    fn test_parse_invalid_lengths() {
        assert_eq!(parse_length_inches(""), None);
        assert_eq!(parse_length_inches("in"), None);
        assert_eq!(parse_length_inches("1furlong"), None);
        assert_eq!(parse_length_inches("-1in"), None);
    }

    #[test]
    fn test_margins_to_inches() {
        let margins = Margins {
            top: "1in".to_string(),
            bottom: "2.54cm".to_string(),
            left: "96px".to_string(),
            right: "72pt".to_string(),
        };
        assert_eq!(margins.to_inches(), Some([1.0, 1.0, 1.0, 1.0]));

        let broken = Margins {
            left: "auto".to_string(),
            ..Margins::default()
        };
        assert_eq!(broken.to_inches(), None);
    }
}
