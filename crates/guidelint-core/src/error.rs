use std::path::PathBuf;

/// Errors that can occur anywhere in the review pipeline.
///
/// Library crates return this type directly; the binary turns it into a
/// `miette` report at the boundary.
///
/// # Examples
///
/// ```
/// use guidelint_core::GuidelintError;
///
/// let err = GuidelintError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GuidelintError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A git invocation failed or returned a non-zero status.
    #[error("git error: {0}")]
    #[diagnostic(help("check that the repository path and comparison branch exist"))]
    Git(String),

    /// Diff or source parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Guideline documents could not be loaded.
    #[error("guidelines error: {0}")]
    #[diagnostic(help("pass --guidelines <file.md|dir> or set `guidelines` in .guidelint.toml"))]
    Guidelines(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GuidelintError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = GuidelintError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn git_error_displays_message() {
        let err = GuidelintError::Git("git merge-base main HEAD: not a valid object".into());
        assert!(err.to_string().starts_with("git error:"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = GuidelintError::FileNotFound(PathBuf::from("/tmp/missing.ts"));
        assert!(err.to_string().contains("/tmp/missing.ts"));
    }
}
