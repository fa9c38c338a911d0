//! Interactive prompt flow
//!
//! Prompts read from any `BufRead` and write to any `Write`, so the whole
//! flow runs against in-memory buffers in tests.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use md2pdf_core::{Config, OutputFormat, ThemeManager};

use crate::convert::{output_path, ConversionResult, Converter};
use crate::files::expand_selection;

pub const BANNER: &str = "=== md2pdf: Markdown to PDF/HTML Converter ===";

/// Line-oriented question/answer over a reader and a writer
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line
    pub fn say(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", line.as_ref())
    }

    /// Ask a question; an empty answer or end of input yields the default
    pub fn ask(&mut self, question: &str, default: Option<&str>) -> io::Result<String> {
        match default {
            Some(default) => write!(self.output, "{} [{}]: ", question, default)?,
            None => write!(self.output, "{}: ", question)?,
        }
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim();

        Ok(if answer.is_empty() {
            default.unwrap_or_default().to_string()
        } else {
            answer.to_string()
        })
    }

    /// Give back the writer
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Ask for a file, directory or glob pattern
///
/// Returns an empty list when nothing was entered or nothing matched.
pub fn prompt_file_selection<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
) -> Result<Vec<PathBuf>> {
    let selection = prompter.ask("Markdown file, directory or glob pattern", None)?;
    if selection.is_empty() {
        return Ok(Vec::new());
    }

    let files = expand_selection(&selection)?;
    match files.len() {
        0 => prompter.say(format!("No Markdown files match '{}'", selection))?,
        1 => prompter.say(format!("Selected {}", files[0].display()))?,
        n => {
            prompter.say(format!("Selected {} files:", n))?;
            for file in &files {
                prompter.say(format!("  {}", file.display()))?;
            }
        }
    }
    Ok(files)
}

/// Ask for `pdf` or `html` until a valid answer arrives
pub fn prompt_output_format<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    default: OutputFormat,
) -> Result<OutputFormat> {
    loop {
        let answer = prompter.ask("Output format (pdf/html)", Some(default.extension()))?;
        match answer.parse() {
            Ok(format) => return Ok(format),
            Err(_) => prompter.say("Please enter 'pdf' or 'html'.")?,
        }
    }
}

/// Show the numbered theme list and ask for a number or a name
pub fn prompt_theme_selection<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    themes: &[String],
    default: &str,
) -> Result<String> {
    prompter.say("Available themes:")?;
    for (i, theme) in themes.iter().enumerate() {
        prompter.say(format!("  {}. {}", i + 1, theme))?;
    }

    loop {
        let answer = prompter.ask("Theme (number or name)", Some(default))?;
        if let Some(theme) = pick_theme(themes, &answer) {
            return Ok(theme);
        }
        if answer == default {
            return Ok(answer);
        }
        prompter.say(format!(
            "Unknown theme '{}'. Enter a number from 1 to {} or a theme name.",
            answer,
            themes.len()
        ))?;
    }
}

fn pick_theme(themes: &[String], answer: &str) -> Option<String> {
    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| themes.get(i))
            .cloned();
    }
    themes.iter().find(|theme| theme.as_str() == answer).cloned()
}

/// Ask for the output file name of a single conversion
pub fn prompt_filename<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    input: &Path,
    format: OutputFormat,
) -> Result<String> {
    let default = output_path(Path::new(input.file_name().unwrap_or_default()), None, format);
    let default = default.display().to_string();
    Ok(prompter.ask("Output filename", Some(&default))?)
}

/// Run the full interactive flow
///
/// Returns the per-file results; empty when the user selected nothing.
pub fn run_interactive<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<Vec<ConversionResult>> {
    let files = prompt_file_selection(prompter)?;
    if files.is_empty() {
        prompter.say("No files selected. Exiting.")?;
        return Ok(Vec::new());
    }

    let format = prompt_output_format(prompter, config.output.format)?;
    let themes = ThemeManager::new(config).list_themes()?;
    let theme = prompt_theme_selection(prompter, &themes, &config.output.default_theme)?;

    // Only a single file gets a custom name; batches keep `<stem>.<format>`
    let single_output = match files.as_slice() {
        [input] => {
            let filename = prompt_filename(prompter, input, format)?;
            Some(input.parent().unwrap_or_else(|| Path::new("")).join(filename))
        }
        _ => None,
    };

    prompter.say(format!(
        "\nConverting {} file(s) to {} with the {} theme...",
        files.len(),
        format.extension().to_uppercase(),
        theme
    ))?;

    let mut converter = Converter::new(config, format, theme);
    let results = match single_output {
        Some(output) => vec![converter.convert_file(&files[0], &output)],
        None => converter.process_batch(&files, None),
    };

    for result in &results {
        match (&result.output, &result.error) {
            (Some(output), _) if result.success => prompter.say(format!(
                "  ✓ {} -> {}",
                result.input.display(),
                output.display()
            ))?,
            (_, error) => prompter.say(format!(
                "  ✗ {}: {}",
                result.input.display(),
                error.as_deref().unwrap_or("unknown error")
            ))?,
        }
    }

    prompter.say("\n✓ Conversion complete!")?;
    Ok(results)
}
