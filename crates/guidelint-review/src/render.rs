//! Human-readable rendering of review comments.

use std::collections::BTreeMap;

use guidelint_core::{ReviewComment, SeverityStyle};

use crate::pipeline::ReviewOutcome;

const RULE_WIDTH: usize = 80;
const WRAP_WIDTH: usize = 76;
const RESET: &str = "\x1b[0m";

/// Message printed when a review produced no comments.
pub const ALL_CLEAR: &str = "\u{2705} All clear! No issues found.";

fn group_by_file(comments: &[ReviewComment]) -> BTreeMap<&str, Vec<&ReviewComment>> {
    let mut by_file: BTreeMap<&str, Vec<&ReviewComment>> = BTreeMap::new();
    for c in comments {
        by_file.entry(c.file_path.as_str()).or_default().push(c);
    }
    for file_comments in by_file.values_mut() {
        file_comments.sort_by_key(|c| c.line);
    }
    by_file
}

/// Terminal report: files in path order, comments by line, body wrapped at
/// 76 columns. ANSI colors only when `use_color` is set.
///
/// # Examples
///
/// ```
/// use guidelint_core::ReviewComment;
/// use guidelint_review::render::render_text;
///
/// assert!(render_text(&[], false).contains("All clear!"));
///
/// let comment = ReviewComment {
///     file_path: "src/a.ts".into(),
///     line: 3,
///     severity: "issue".into(),
///     comment: "issue: unused import".into(),
/// };
/// let out = render_text(&[comment], false);
/// assert!(out.contains("Line 3: ISSUE"));
/// assert!(out.contains("Found 1 issue(s) across 1 file(s)"));
/// ```
pub fn render_text(comments: &[ReviewComment], use_color: bool) -> String {
    if comments.is_empty() {
        return format!("\n{ALL_CLEAR}\n");
    }

    let heavy = "\u{2550}".repeat(RULE_WIDTH);
    let light = "\u{2500}".repeat(RULE_WIDTH);
    let by_file = group_by_file(comments);

    let mut out = String::new();
    out.push_str(&format!("\n{heavy}\n\u{1f4cb} CODE REVIEW RESULTS\n{heavy}\n\n"));

    for (file, file_comments) in &by_file {
        out.push_str(&format!("\u{1f4c4} {file}\n{light}\n"));
        for c in file_comments {
            let style = SeverityStyle::classify(&c.severity);
            let label = c.severity.to_uppercase();
            if use_color {
                out.push_str(&format!(
                    "  {} Line {}: {}{label}{RESET}\n",
                    style.marker(),
                    c.line,
                    style.color()
                ));
            } else {
                out.push_str(&format!("  {} Line {}: {label}\n", style.marker(), c.line));
            }
            for line in word_wrap(&c.comment, WRAP_WIDTH).lines() {
                out.push_str(&format!("    {line}\n"));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "{heavy}\nFound {} issue(s) across {} file(s)\n{heavy}\n",
        comments.len(),
        by_file.len()
    ));
    out
}

/// Greedy word wrap on whitespace. Words longer than `width` stay whole.
///
/// # Examples
///
/// ```
/// use guidelint_review::render::word_wrap;
///
/// assert_eq!(word_wrap("one two three", 7), "one two\nthree");
/// ```
pub fn word_wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        return text.to_string();
    }
    lines.join("\n")
}

/// Markdown report with a stats line and one section per file.
///
/// # Examples
///
/// ```
/// use guidelint_review::pipeline::ReviewOutcome;
/// use guidelint_review::render::to_markdown;
///
/// let md = to_markdown(&ReviewOutcome::default());
/// assert!(md.contains("# Review Results"));
/// assert!(md.contains("No issues found."));
/// ```
pub fn to_markdown(outcome: &ReviewOutcome) -> String {
    let stats = &outcome.stats;
    let mut out = String::from("# Review Results\n\n");
    out.push_str(&format!(
        "**Model:** {} | **Files:** {} | **Batches:** {} (failed: {}) | **Comments:** {}\n\n",
        stats.model_used,
        stats.files_reviewed,
        stats.batches,
        stats.batches_failed,
        outcome.comments.len(),
    ));

    if outcome.comments.is_empty() {
        out.push_str("No issues found.\n");
    }

    for (file, file_comments) in group_by_file(&outcome.comments) {
        out.push_str(&format!("## `{file}`\n\n"));
        for c in file_comments {
            let style = SeverityStyle::classify(&c.severity);
            out.push_str(&format!(
                "- {} **Line {}** `{}`: {}\n",
                style.marker(),
                c.line,
                c.severity,
                c.comment
            ));
        }
        out.push('\n');
    }

    let summaries: Vec<&String> = outcome.summaries.iter().filter(|s| !s.is_empty()).collect();
    if !summaries.is_empty() {
        out.push_str("## Summary\n\n");
        for s in summaries {
            out.push_str(&format!("> {s}\n\n"));
        }
    }
    out
}
