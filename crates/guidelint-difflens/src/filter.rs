//! Eligibility filtering of changed files before they reach the model.
//!
//! Only TypeScript/JavaScript sources are reviewed. Documentation, data
//! files, build output and vendored dependencies are dropped, as is anything
//! matching a user-supplied glob.

use guidelint_core::{ChangedFile, Language, ReviewConfig};
use tracing::debug;

const EXCLUDED_SUFFIXES: [&str; 2] = [".md", ".json"];

const EXCLUDED_MARKERS: [&str; 3] = ["node_modules", "dist", ".gitlab"];

/// Decides which changed files are worth reviewing.
///
/// # Examples
///
/// ```
/// use guidelint_difflens::filter::EligibilityFilter;
///
/// let filter = EligibilityFilter::default_filter();
/// assert!(filter.should_skip("package.json"));
/// assert!(filter.should_skip("node_modules/react/index.js"));
/// assert!(!filter.should_skip("src/App.tsx"));
/// ```
pub struct EligibilityFilter {
    skip_patterns: Vec<glob::Pattern>,
    limit: usize,
}

impl EligibilityFilter {
    /// The built-in rules only, no cap.
    pub fn default_filter() -> Self {
        Self {
            skip_patterns: Vec::new(),
            limit: 0,
        }
    }

    /// Built-in rules plus the configured glob patterns and file cap.
    ///
    /// Invalid patterns are ignored with a debug log.
    ///
    /// # Examples
    ///
    /// ```
    /// use guidelint_core::ReviewConfig;
    /// use guidelint_difflens::filter::EligibilityFilter;
    ///
    /// let config = ReviewConfig {
    ///     skip_patterns: vec!["*.test.ts".into()],
    ///     ..ReviewConfig::default()
    /// };
    /// let filter = EligibilityFilter::from_config(&config);
    /// assert!(filter.should_skip("src/app.test.ts"));
    /// assert!(!filter.should_skip("src/app.ts"));
    /// ```
    pub fn from_config(config: &ReviewConfig) -> Self {
        let mut skip_patterns = Vec::new();
        for pat in &config.skip_patterns {
            match glob::Pattern::new(pat) {
                Ok(p) => skip_patterns.push(p),
                Err(e) => debug!("ignoring invalid skip pattern {pat:?}: {e}"),
            }
        }

        Self {
            skip_patterns,
            limit: config.max_files,
        }
    }

    /// Check if a single path should be skipped.
    pub fn should_skip(&self, path: &str) -> bool {
        self.check_skip(path).is_some()
    }

    /// Keep the eligible files in input order, stopping at the cap.
    pub fn filter(&self, files: Vec<ChangedFile>) -> FilterResult {
        let mut kept = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            if self.limit > 0 && kept.len() >= self.limit {
                break;
            }
            match self.check_skip(file.resolved_path()) {
                Some(reason) => {
                    debug!("skipping {} ({reason})", file.resolved_path());
                    skipped.push(SkippedFile {
                        path: file.resolved_path().to_string(),
                        reason,
                    });
                }
                None => kept.push(file),
            }
        }

        FilterResult { kept, skipped }
    }

    fn check_skip(&self, path: &str) -> Option<SkipReason> {
        if path.is_empty() {
            return Some(SkipReason::EmptyPath);
        }

        if EXCLUDED_SUFFIXES.iter().any(|s| path.ends_with(s)) {
            return Some(SkipReason::NonCode);
        }

        if EXCLUDED_MARKERS.iter().any(|m| path.contains(m)) {
            return Some(SkipReason::VendoredOrBuild);
        }

        if !Language::EXTENSIONS.iter().any(|e| path.ends_with(e)) {
            return Some(SkipReason::UnsupportedLanguage);
        }

        self.skip_patterns
            .iter()
            .find(|p| p.matches(path))
            .map(|p| SkipReason::PatternMatch(p.to_string()))
    }
}

/// Keep only reviewable files, preserving order; `limit` of 0 means no cap.
///
/// # Examples
///
/// ```
/// use guidelint_core::ChangedFile;
/// use guidelint_difflens::filter::filter_eligible;
///
/// let files = vec![
///     ChangedFile::new("README.md", "", 1, 0),
///     ChangedFile::new("src/a.ts", "", 1, 0),
///     ChangedFile::new("src/b.js", "", 1, 0),
/// ];
/// let kept = filter_eligible(files, 1);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].new_path, "src/a.ts");
/// ```
pub fn filter_eligible(files: Vec<ChangedFile>, limit: usize) -> Vec<ChangedFile> {
    let filter = EligibilityFilter {
        skip_patterns: Vec::new(),
        limit,
    };
    filter.filter(files).kept
}

/// Result of filtering changed files.
pub struct FilterResult {
    /// Files that passed the filter.
    pub kept: Vec<ChangedFile>,
    /// Files that were rejected, with reasons.
    pub skipped: Vec<SkippedFile>,
}

/// A file that was rejected during filtering.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Resolved path of the skipped file.
    pub path: String,
    /// Why the file was skipped.
    pub reason: SkipReason,
}

/// Reason a file was skipped.
///
/// # Examples
///
/// ```
/// use guidelint_difflens::filter::SkipReason;
///
/// assert_eq!(SkipReason::VendoredOrBuild.to_string(), "vendored or build output");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither a new nor an old path.
    EmptyPath,
    /// Documentation or structured data.
    NonCode,
    /// Dependency or build output directory.
    VendoredOrBuild,
    /// Not one of the reviewed script/markup extensions.
    UnsupportedLanguage,
    /// Matched a custom skip pattern.
    PatternMatch(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyPath => write!(f, "empty path"),
            SkipReason::NonCode => write!(f, "documentation or data file"),
            SkipReason::VendoredOrBuild => write!(f, "vendored or build output"),
            SkipReason::UnsupportedLanguage => write!(f, "unsupported language"),
            SkipReason::PatternMatch(pat) => write!(f, "pattern: {pat}"),
        }
    }
}
