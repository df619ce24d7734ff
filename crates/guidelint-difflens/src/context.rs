//! Source windows around changed lines.
//!
//! The post-change content of a file is fetched from HEAD (or the working
//! tree when it is not committed yet) and a few lines on either side of each
//! added line are rendered with line numbers, the changed line marked `>>>`.

use std::collections::BTreeMap;
use std::path::Path;

use guidelint_core::{ChangedFile, ContextWindow, GuidelintError, Language};
use tracing::debug;

use crate::git::show_file;
use crate::parser::parse_changed_lines;

/// Lines shown on each side of a changed line unless configured otherwise.
pub const DEFAULT_RADIUS: u32 = 5;

const CHANGED_MARKER: &str = ">>> ";
const PLAIN_MARKER: &str = "    ";

/// Render lines `line - radius ..= line + radius` of `content`.
///
/// `line` is 1-based. The window is clamped to the file; a line entirely
/// outside the file renders as an empty string.
///
/// # Examples
///
/// ```
/// use guidelint_difflens::context::render_window;
///
/// let window = render_window("a\nb\nc", 1, 1);
/// assert_eq!(window, ">>>    1: a\n       2: b");
/// assert_eq!(render_window("a\nb", 9, 1), "");
/// ```
pub fn render_window(content: &str, line: u32, radius: u32) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let line = line as usize;
    let radius = radius as usize;

    let start = line.saturating_sub(radius + 1);
    let end = (line + radius).min(lines.len());
    if start >= lines.len() || end == 0 || start >= end {
        return String::new();
    }

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(offset, text)| {
            let number = start + offset + 1;
            let marker = if number == line {
                CHANGED_MARKER
            } else {
                PLAIN_MARKER
            };
            format!("{marker}{number:4}: {text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Post-change content of `path`: `HEAD:path` first, then the file on disk.
///
/// # Errors
///
/// Returns [`GuidelintError::FileNotFound`] when neither source has the
/// file, or [`GuidelintError::Io`] when the file exists but can't be read.
pub fn fetch_file_content(repo: &Path, path: &str) -> Result<String, GuidelintError> {
    match show_file(repo, "HEAD", path) {
        Ok(content) => Ok(content),
        Err(e) => {
            debug!("{path} not readable at HEAD ({e}), falling back to disk");
            let on_disk = repo.join(path);
            if !on_disk.is_file() {
                return Err(GuidelintError::FileNotFound(on_disk));
            }
            Ok(std::fs::read_to_string(on_disk)?)
        }
    }
}

/// Tag the file's language and build windows around its added lines.
///
/// The returned window map has one entry per changed line, even when the
/// window itself is empty.
///
/// # Errors
///
/// Propagates [`fetch_file_content`] failures. Callers are expected to
/// carry on with the unenriched file.
pub fn enrich(
    repo: &Path,
    file: &ChangedFile,
    radius: u32,
) -> Result<(ChangedFile, ContextWindow), GuidelintError> {
    let mut tagged = file.clone();
    tagged.language = Language::from_path(file.resolved_path());

    let mut changed_lines = parse_changed_lines(&file.diff);
    changed_lines.sort_unstable();
    changed_lines.dedup();

    if changed_lines.is_empty() {
        return Ok((tagged, ContextWindow::default()));
    }

    let content = fetch_file_content(repo, file.resolved_path())?;
    let windows: BTreeMap<u32, String> = changed_lines
        .iter()
        .map(|&line| (line, render_window(&content, line, radius)))
        .collect();

    Ok((
        tagged,
        ContextWindow {
            changed_lines,
            windows,
        },
    ))
}
