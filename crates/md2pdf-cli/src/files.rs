//! Input file resolution

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;

/// Regular files matching a glob pattern (`**` supported)
pub fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read {}", e),
        }
    }
    Ok(files)
}

/// Resolve file paths and glob patterns
///
/// Existing files are taken as-is, anything else is globbed. Every pattern
/// must match at least one file. The result is sorted and free of duplicates.
pub fn resolve_files<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut resolved = BTreeSet::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let path = Path::new(pattern);
        if path.is_file() {
            resolved.insert(path.to_path_buf());
            continue;
        }

        let matches = glob_files(pattern)?;
        if matches.is_empty() {
            bail!("No files found matching: {}", pattern);
        }
        resolved.extend(matches);
    }

    if resolved.is_empty() {
        bail!("No files found");
    }

    Ok(resolved.into_iter().collect())
}

/// Expand an interactive selection
///
/// A directory selects its `*.md` files, a file selects itself, anything
/// else is a glob pattern. No match is an empty selection, not an error.
pub fn expand_selection(selection: &str) -> Result<Vec<PathBuf>> {
    let selection = selection.trim();
    if selection.is_empty() {
        return Ok(Vec::new());
    }

    let path = Path::new(selection);
    let mut files = if path.is_dir() {
        let dir = glob::Pattern::escape(&path.display().to_string());
        glob_files(&format!("{}/*.md", dir.trim_end_matches('/')))?
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        glob_files(selection)?
    };

    files.sort();
    files.dedup();
    Ok(files)
}
