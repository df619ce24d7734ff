use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One file's changes between the comparison point and the working state.
///
/// # Examples
///
/// ```
/// use guidelint_core::ChangedFile;
///
/// let file = ChangedFile::new("src/app.ts", "@@ -1 +1 @@\n-a\n+b\n", 1, 1);
/// assert_eq!(file.change_count(), 2);
/// assert!(file.language.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path before the change.
    pub old_path: String,
    /// Path after the change.
    pub new_path: String,
    /// Raw unified diff text for this file.
    pub diff: String,
    /// Number of added lines (excluding the `+++` header).
    pub additions: usize,
    /// Number of removed lines (excluding the `---` header).
    pub deletions: usize,
    /// Language tag, assigned during context enrichment.
    pub language: Option<Language>,
}

impl ChangedFile {
    /// Create a record whose old and new paths are the same.
    pub fn new(path: impl Into<String>, diff: impl Into<String>, additions: usize, deletions: usize) -> Self {
        let path = path.into();
        Self {
            old_path: path.clone(),
            new_path: path,
            diff: diff.into(),
            additions,
            deletions,
            language: None,
        }
    }

    /// The path used for eligibility decisions: the new path, or the old
    /// path when the new one is empty.
    pub fn resolved_path(&self) -> &str {
        if self.new_path.is_empty() {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// Total changed lines (additions + deletions).
    pub fn change_count(&self) -> usize {
        self.additions + self.deletions
    }
}

/// Script/markup languages recognised for review.
///
/// # Examples
///
/// ```
/// use guidelint_core::Language;
///
/// assert_eq!(Language::from_path("src/App.tsx"), Some(Language::Tsx));
/// assert_eq!(Language::from_path("src/index.ts"), Some(Language::TypeScript));
/// assert_eq!(Language::from_path("README.md"), None);
/// assert_eq!(Language::Jsx.tag(), "jsx");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
}

impl Language {
    /// File suffixes accepted by the eligibility filter.
    pub const EXTENSIONS: [&'static str; 4] = [".ts", ".tsx", ".js", ".jsx"];

    /// Detect the language from a path suffix.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with(".tsx") {
            Some(Language::Tsx)
        } else if path.ends_with(".ts") {
            Some(Language::TypeScript)
        } else if path.ends_with(".jsx") {
            Some(Language::Jsx)
        } else if path.ends_with(".js") {
            Some(Language::JavaScript)
        } else {
            None
        }
    }

    /// Tag shown in the review prompt.
    pub fn tag(self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Jsx => "jsx",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Rendered source windows around each changed line of one file.
///
/// The keys of `windows` are exactly the entries of `changed_lines`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextWindow {
    /// Changed line numbers in the new file, ascending and unique.
    pub changed_lines: Vec<u32>,
    /// Line number -> rendered window (empty when out of bounds).
    pub windows: BTreeMap<u32, String>,
}

impl ContextWindow {
    /// `true` when there is no window text to show.
    pub fn is_empty(&self) -> bool {
        self.windows.values().all(|w| w.is_empty())
    }
}

/// A group of files reviewed in a single request.
///
/// # Examples
///
/// ```
/// use guidelint_core::Batch;
///
/// let batch = Batch::default();
/// assert!(batch.files.is_empty());
/// assert_eq!(batch.total_changes, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    /// Files in input order.
    pub files: Vec<ChangedFile>,
    /// Sum of additions + deletions of every file.
    pub total_changes: usize,
}

/// A single review comment returned by the model.
///
/// # Examples
///
/// ```
/// use guidelint_core::ReviewComment;
///
/// let comment: ReviewComment = serde_json::from_str(
///     r#"{"filePath":"src/a.ts","line":3,"severity":"issue","comment":"issue: rename"}"#,
/// ).unwrap();
/// assert_eq!(comment.file_path, "src/a.ts");
/// assert_eq!(comment.line, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewComment {
    /// Path of the file being commented on.
    pub file_path: String,
    /// Line number in the new version of the file.
    pub line: u32,
    /// Free-text explanation.
    pub comment: String,
    /// Free-text severity label.
    pub severity: String,
}

/// Structured reply for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewResponse {
    pub comments: Vec<ReviewComment>,
    pub summary: String,
}

/// What the working state is compared against.
///
/// # Examples
///
/// ```
/// use guidelint_core::ComparisonMode;
///
/// assert_eq!(
///     ComparisonMode::select("main", false),
///     ComparisonMode::AgainstMergeBase("main".into()),
/// );
/// assert_eq!(ComparisonMode::select("HEAD", false), ComparisonMode::AgainstRef("HEAD".into()));
/// assert_eq!(ComparisonMode::select("origin/main", true), ComparisonMode::Local("origin/main".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonMode {
    /// Working tree against a named branch.
    Local(String),
    /// Only the commits made since diverging from a branch.
    AgainstMergeBase(String),
    /// Working tree against a ref.
    AgainstRef(String),
}

impl ComparisonMode {
    /// Pick the mode from a target branch and the local flag.
    ///
    /// An empty target means `HEAD`.
    pub fn select(target: &str, local: bool) -> Self {
        let target = target.trim();
        let target = if target.is_empty() { "HEAD" } else { target };
        if local {
            ComparisonMode::Local(target.to_string())
        } else if target != "HEAD" {
            ComparisonMode::AgainstMergeBase(target.to_string())
        } else {
            ComparisonMode::AgainstRef(target.to_string())
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonMode::Local(b) => write!(f, "working tree vs {b}"),
            ComparisonMode::AgainstMergeBase(b) => write!(f, "merge-base({b}, HEAD)..HEAD"),
            ComparisonMode::AgainstRef(r) => write!(f, "working tree vs {r}"),
        }
    }
}

/// Display class of a free-text severity label.
///
/// # Examples
///
/// ```
/// use guidelint_core::SeverityStyle;
///
/// assert_eq!(SeverityStyle::classify("Suggestion(blocking)"), SeverityStyle::Blocking);
/// assert_eq!(SeverityStyle::classify("nit"), SeverityStyle::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityStyle {
    Blocking,
    Question,
    Issue,
    Suggestion,
    Other,
}

impl SeverityStyle {
    /// Case-insensitive substring match, first hit wins:
    /// blocking, question, issue, suggestion.
    pub fn classify(severity: &str) -> Self {
        let s = severity.to_lowercase();
        if s.contains("blocking") {
            SeverityStyle::Blocking
        } else if s.contains("question") {
            SeverityStyle::Question
        } else if s.contains("issue") {
            SeverityStyle::Issue
        } else if s.contains("suggestion") {
            SeverityStyle::Suggestion
        } else {
            SeverityStyle::Other
        }
    }

    /// Emoji marker printed before the line number.
    pub fn marker(self) -> &'static str {
        match self {
            SeverityStyle::Blocking => "\u{1f6a8}",
            SeverityStyle::Question => "\u{2753}",
            SeverityStyle::Issue => "\u{26a0}\u{fe0f}",
            SeverityStyle::Suggestion => "\u{1f4a1}",
            SeverityStyle::Other => "\u{2139}\u{fe0f}",
        }
    }

    /// ANSI color escape for the severity label.
    pub fn color(self) -> &'static str {
        match self {
            SeverityStyle::Blocking => "\x1b[1;31m",
            SeverityStyle::Question | SeverityStyle::Issue => "\x1b[1;33m",
            SeverityStyle::Suggestion => "\x1b[1;36m",
            SeverityStyle::Other => "\x1b[0m",
        }
    }
}

/// Output format for the review results.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use guidelint_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Terminal rendering grouped by file.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_path_falls_back_to_old_path() {
        let mut file = ChangedFile::new("old.ts", "", 0, 0);
        file.new_path.clear();
        assert_eq!(file.resolved_path(), "old.ts");
    }

    #[test]
    fn language_prefers_longer_suffix() {
        assert_eq!(Language::from_path("a.tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_path("a.jsx"), Some(Language::Jsx));
        assert_eq!(Language::from_path("a.js"), Some(Language::JavaScript));
        assert_eq!(Language::from_path("a.rs"), None);
    }

    #[test]
    fn comparison_mode_empty_target_is_head() {
        assert_eq!(ComparisonMode::select("", false), ComparisonMode::AgainstRef("HEAD".into()));
        assert_eq!(ComparisonMode::select("  ", true), ComparisonMode::Local("HEAD".into()));
    }

    #[test]
    fn severity_priority_order() {
        assert_eq!(SeverityStyle::classify("blocking issue"), SeverityStyle::Blocking);
        assert_eq!(SeverityStyle::classify("Question Non blocking:"), SeverityStyle::Blocking);
        assert_eq!(SeverityStyle::classify("QUESTION"), SeverityStyle::Question);
        assert_eq!(SeverityStyle::classify("Issue"), SeverityStyle::Issue);
        assert_eq!(SeverityStyle::classify("suggestion"), SeverityStyle::Suggestion);
        assert_eq!(SeverityStyle::classify(""), SeverityStyle::Other);
    }

    #[test]
    fn distinct_styles_for_blocking_question_suggestion() {
        let pairs: Vec<(&str, &str)> = ["blocking issue", "question", "suggestion"]
            .iter()
            .map(|s| {
                let style = SeverityStyle::classify(s);
                (style.marker(), style.color())
            })
            .collect();
        assert_eq!(pairs[0], ("\u{1f6a8}", "\x1b[1;31m"));
        assert_eq!(pairs[1], ("\u{2753}", "\x1b[1;33m"));
        assert_eq!(pairs[2], ("\u{1f4a1}", "\x1b[1;36m"));
        assert_ne!(pairs[0], pairs[1]);
        assert_ne!(pairs[1], pairs[2]);
        assert_ne!(pairs[0], pairs[2]);
    }

    #[test]
    fn review_comment_tolerates_missing_fields() {
        let c: ReviewComment = serde_json::from_str(r#"{"filePath":"a.ts"}"#).unwrap();
        assert_eq!(c.line, 0);
        assert!(c.severity.is_empty());
    }

    #[test]
    fn review_comment_serializes_camel_case() {
        let comment = ReviewComment {
            file_path: "a.ts".into(),
            line: 1,
            comment: "x".into(),
            severity: "issue".into(),
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert!(json.get("filePath").is_some());
        assert!(json.get("file_path").is_none());
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn context_window_emptiness() {
        let mut ctx = ContextWindow::default();
        assert!(ctx.is_empty());
        ctx.changed_lines.push(3);
        ctx.windows.insert(3, String::new());
        assert!(ctx.is_empty());
        ctx.windows.insert(3, ">>>    3: x".into());
        assert!(!ctx.is_empty());
    }
}
