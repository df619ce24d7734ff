//! Loading of the Markdown guideline documents the review is checked against.

use std::path::{Path, PathBuf};

use guidelint_core::GuidelintError;
use tracing::debug;

/// Load guidelines from a single `.md` file or every `*.md` file in a
/// directory (non-recursive, sorted by path).
///
/// Each document becomes a section titled after its file stem, with spaces
/// inserted before interior capitals (`ErrorHandling.md` -> `Error Handling`).
///
/// # Errors
///
/// Returns [`GuidelintError::Guidelines`] if the path is missing, a single
/// file is not Markdown, or a directory has no Markdown files, and
/// [`GuidelintError::Io`] if a document cannot be read.
///
/// # Examples
///
/// ```
/// use guidelint_review::guidelines::load_guidelines;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("ReactHooks.md");
/// std::fs::write(&path, "Call hooks at the top level.").unwrap();
///
/// let text = load_guidelines(&path).unwrap();
/// assert_eq!(text, "\n# React Hooks\n\nCall hooks at the top level.\n\n");
/// ```
pub fn load_guidelines(path: &Path) -> Result<String, GuidelintError> {
    let files = guideline_files(path)?;

    let mut text = String::new();
    for file in &files {
        debug!("loading guidelines from {}", file.display());
        let content = std::fs::read_to_string(file)?;
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        text.push_str("\n# ");
        text.push_str(split_camel_case(&stem).trim());
        text.push_str("\n\n");
        text.push_str(&content);
        text.push_str("\n\n");
    }

    Ok(text)
}

fn guideline_files(path: &Path) -> Result<Vec<PathBuf>, GuidelintError> {
    if path.is_dir() {
        let pattern = format!(
            "{}/*.md",
            glob::Pattern::escape(&path.to_string_lossy())
        );
        let mut files: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| GuidelintError::Guidelines(format!("invalid guidelines path: {e}")))?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        if files.is_empty() {
            return Err(GuidelintError::Guidelines(format!(
                "no markdown files found in directory {}",
                path.display()
            )));
        }
        files.sort();
        return Ok(files);
    }

    if !path.exists() {
        return Err(GuidelintError::Guidelines(format!(
            "{} does not exist",
            path.display()
        )));
    }

    if path.extension().and_then(|e| e.to_str()) != Some("md") {
        return Err(GuidelintError::Guidelines(format!(
            "guidelines file must be a .md file, got: {}",
            path.display()
        )));
    }

    Ok(vec![path.to_path_buf()])
}

/// `"CodeStyleGuide"` -> `"Code Style Guide"`.
fn split_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, c) in input.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
