use guidelint_core::{ChangedFile, ContextWindow, ReviewResponse};
use tracing::warn;

const SYSTEM_PROMPT: &str = "You are a deterministic senior software engineer performing a code \
review. You must produce IDENTICAL results for identical inputs.";

/// Summary used when the model's reply is not the expected JSON.
pub const PARSE_FAILURE_SUMMARY: &str = "Failed to parse AI response";

const SEPARATOR_WIDTH: usize = 80;

const INSTRUCTIONS: &str = "\
## CRITICAL Instructions - Follow Exactly

1. Go through the files in the order they are listed above
2. Only look at changed lines (the lines starting with + in each diff)
3. Report a change only when it breaks a specific rule from the guidelines
4. Do not report style or preference issues the guidelines do not cover
5. Identical code must always get the identical comment
6. Every violation MUST carry these fields:
   - **filePath**: the file path exactly as written in its \"### File\" heading
   - **line**: the line number in the new version of the file
   - **severity**: one of \"issue\", \"question\", \"suggestion(blocking)\", \"suggestion(non-blocking)\"
   - **comment**: a short, conversational explanation that starts with the severity, e.g.
     * \"issue: this promise is never awaited, so errors are swallowed\"
     * \"question: is this handler meant to run on every render?\"
     * \"suggestion(blocking): please add a unit test for this branch\"
     * \"suggestion(non-blocking): this could be a const\"

## Response Format - MANDATORY

Reply with ONLY valid JSON in exactly this shape, with nothing before or after it:

```json
{
  \"comments\": [
    {
      \"filePath\": \"src/components/Button.tsx\",
      \"line\": 42,
      \"severity\": \"issue\",
      \"comment\": \"issue: this promise is never awaited, so errors are swallowed\"
    },
    {
      \"filePath\": \"src/components/Button.tsx\",
      \"line\": 57,
      \"severity\": \"suggestion(blocking)\",
      \"comment\": \"suggestion(blocking): please add a unit test for this branch\"
    }
  ],
  \"summary\": \"Found N violations across M files. Main issues: ...\"
}
```

IMPORTANT:
- If there are no violations, reply: {\"comments\": [], \"summary\": \"No violations found\"}
- Use the same severity for the same kind of violation every time
- Phrase comments for identical violations identically
- Start every comment with its severity prefix (\"issue:\", \"question:\", \"suggestion(blocking):\", ...)
";

/// A changed file together with its optional source windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedFile {
    pub file: ChangedFile,
    pub context: Option<ContextWindow>,
}

impl EnrichedFile {
    /// A file without context.
    pub fn bare(file: ChangedFile) -> Self {
        Self {
            file,
            context: None,
        }
    }
}

/// Build the system prompt for the code review LLM.
///
/// # Examples
///
/// ```
/// use guidelint_review::prompt::build_system_prompt;
///
/// assert!(build_system_prompt().contains("IDENTICAL results"));
/// ```
pub fn build_system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Assemble the user prompt for one batch.
///
/// Files are listed by ascending new path regardless of input order, so the
/// same batch always yields the same text.
///
/// # Examples
///
/// ```
/// use guidelint_core::ChangedFile;
/// use guidelint_review::prompt::{build_batch_prompt, EnrichedFile};
///
/// let files = vec![EnrichedFile::bare(ChangedFile::new("src/a.ts", "+x", 1, 0))];
/// let prompt = build_batch_prompt("# Rules\n\nNo any.", &files);
/// assert!(prompt.contains("### File 1: src/a.ts"));
/// assert!(prompt.contains("No any."));
/// ```
pub fn build_batch_prompt(guidelines: &str, files: &[EnrichedFile]) -> String {
    let mut prompt = String::from("# Code Review Task - Multiple Files\n\n");
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push('\n');
    prompt.push_str("Review every file below ONLY against the guidelines that follow.\n");
    prompt.push_str("Do not use subjective judgment: only report changes that break a rule.\n\n");

    prompt.push_str("## Guidelines\n");
    prompt.push_str(guidelines);
    prompt.push_str("\n## Files Being Reviewed\n\n");

    let mut ordered: Vec<&EnrichedFile> = files.iter().collect();
    ordered.sort_by(|a, b| a.file.new_path.cmp(&b.file.new_path));

    for (i, entry) in ordered.iter().enumerate() {
        let file = &entry.file;
        let language = file.language.map_or("unknown", |l| l.tag());

        prompt.push_str(&format!("### File {}: {}\n", i + 1, file.new_path));
        prompt.push_str(&format!(
            "**Language:** {language} | **Changes:** +{} -{}\n\n",
            file.additions, file.deletions
        ));
        prompt.push_str("```diff\n");
        prompt.push_str(&file.diff);
        prompt.push_str("\n```\n\n");

        if let Some(ctx) = entry.context.as_ref().filter(|c| !c.is_empty()) {
            prompt.push_str("**Enhanced Context:**\n");
            // BTreeMap iteration is already ascending by line
            for (line, window) in &ctx.windows {
                if !window.is_empty() {
                    prompt.push_str(&format!("\nLine {line} context:\n{window}\n"));
                }
            }
            prompt.push('\n');
        }

        prompt.push_str(&"-".repeat(SEPARATOR_WIDTH));
        prompt.push_str("\n\n");
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTIONS);
    prompt
}

/// The JSON text inside the first fenced block, or the whole reply.
///
/// The opening fence may carry a `json` tag. An unterminated fence is
/// treated as no fence.
///
/// # Examples
///
/// ```
/// use guidelint_review::prompt::extract_json_payload;
///
/// assert_eq!(extract_json_payload("ok:\n```json\n{}\n```"), "{}");
/// assert_eq!(extract_json_payload("{\"a\":1}"), "{\"a\":1}");
/// ```
pub fn extract_json_payload(raw: &str) -> &str {
    let Some(open) = raw.find("```") else {
        return raw;
    };
    let after = &raw[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(close) => after[..close].trim(),
        None => raw,
    }
}

/// Decode a model reply into a [`ReviewResponse`].
///
/// Never fails: an undecodable reply becomes an empty comment list with
/// [`PARSE_FAILURE_SUMMARY`].
///
/// # Examples
///
/// ```
/// use guidelint_review::prompt::parse_review_response;
///
/// let resp = parse_review_response(r#"{"comments":[],"summary":"No violations found"}"#);
/// assert!(resp.comments.is_empty());
/// assert_eq!(resp.summary, "No violations found");
///
/// let bad = parse_review_response("I could not review this.");
/// assert_eq!(bad.summary, "Failed to parse AI response");
/// ```
pub fn parse_review_response(raw: &str) -> ReviewResponse {
    let payload = extract_json_payload(raw);
    match serde_json::from_str(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("failed to parse LLM response: {e}");
            ReviewResponse {
                comments: Vec::new(),
                summary: PARSE_FAILURE_SUMMARY.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use guidelint_core::Language;

    use super::*;

    fn enriched(path: &str, context: Option<ContextWindow>) -> EnrichedFile {
        let mut file = ChangedFile::new(path, format!("@@ -1 +1 @@\n-old\n+new {path}"), 1, 1);
        file.language = Language::from_path(path);
        EnrichedFile { file, context }
    }

    fn window(entries: &[(u32, &str)]) -> ContextWindow {
        let windows: BTreeMap<u32, String> =
            entries.iter().map(|(l, w)| (*l, w.to_string())).collect();
        ContextWindow {
            changed_lines: windows.keys().copied().collect(),
            windows,
        }
    }

    #[test]
    fn files_sorted_by_path() {
        let prompt = build_batch_prompt("", &[enriched("src/z.ts", None), enriched("src/a.tsx", None)]);
        let a = prompt.find("### File 1: src/a.tsx").unwrap();
        let z = prompt.find("### File 2: src/z.ts").unwrap();
        assert!(a < z);
        assert!(prompt.contains("**Language:** tsx | **Changes:** +1 -1"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let files = [enriched("b.js", None), enriched("a.ts", Some(window(&[(3, "ctx")])))];
        let reversed = [files[1].clone(), files[0].clone()];
        assert_eq!(build_batch_prompt("g", &files), build_batch_prompt("g", &reversed));
    }

    #[test]
    fn unknown_language_when_untagged() {
        let file = EnrichedFile::bare(ChangedFile::new("a.ts", "+x", 1, 0));
        let prompt = build_batch_prompt("", &[file]);
        assert!(prompt.contains("**Language:** unknown | **Changes:** +1 -0"));
    }

    #[test]
    fn context_section_skips_empty_windows() {
        let ctx = window(&[(9, ">>>    9: late"), (2, ">>>    2: early"), (40, "")]);
        let prompt = build_batch_prompt("", &[enriched("a.ts", Some(ctx))]);

        assert!(prompt.contains("**Enhanced Context:**"));
        let early = prompt.find("Line 2 context:\n>>>    2: early").unwrap();
        let late = prompt.find("Line 9 context:\n>>>    9: late").unwrap();
        assert!(early < late);
        assert!(!prompt.contains("Line 40 context"));
    }

    #[test]
    fn all_empty_context_is_omitted() {
        let prompt = build_batch_prompt("", &[enriched("a.ts", Some(window(&[(1, "")])))]);
        assert!(!prompt.contains("Enhanced Context"));
        assert!(prompt.contains(&"-".repeat(80)));
    }

    #[test]
    fn prompt_carries_guidelines_and_contract() {
        let prompt = build_batch_prompt("\n# Naming\n\nUse camelCase.\n\n", &[enriched("a.ts", None)]);
        assert!(prompt.starts_with("# Code Review Task - Multiple Files"));
        assert!(prompt.contains("Use camelCase."));
        assert!(prompt.contains("## CRITICAL Instructions - Follow Exactly"));
        assert!(prompt.contains("## Response Format - MANDATORY"));
        for severity in ["\"issue\"", "\"question\"", "\"suggestion(blocking)\"", "\"suggestion(non-blocking)\""] {
            assert!(prompt.contains(severity), "missing {severity}");
        }
        assert!(prompt.contains("```diff\n@@ -1 +1 @@\n-old\n+new a.ts\n```"));
    }

    #[test]
    fn fenced_and_raw_decode_identically() {
        let json = r#"{"comments":[{"filePath":"src/a.ts","line":4,"severity":"issue","comment":"issue: x"}],"summary":"s"}"#;
        let fenced = format!("Here you go:\n```json\n{json}\n```\nthanks");
        let bare_fence = format!("```\n{json}\n```");

        let raw = parse_review_response(json);
        assert_eq!(raw, parse_review_response(&fenced));
        assert_eq!(raw, parse_review_response(&bare_fence));
        assert_eq!(raw.comments[0].file_path, "src/a.ts");
        assert_eq!(raw.comments[0].line, 4);
    }

    #[test]
    fn malformed_reply_gets_fixed_summary() {
        for reply in ["not json", "```json\n{\"comments\": [\n```", "", "{\"comments\": 3}"] {
            let resp = parse_review_response(reply);
            assert!(resp.comments.is_empty());
            assert_eq!(resp.summary, PARSE_FAILURE_SUMMARY);
        }
    }

    #[test]
    fn missing_fields_default() {
        let resp = parse_review_response(r#"{"comments":[{"filePath":"a.ts","line":1}]}"#);
        assert_eq!(resp.summary, "");
        assert_eq!(resp.comments[0].severity, "");
    }

    #[test]
    fn unterminated_fence_uses_raw_text() {
        assert_eq!(extract_json_payload("```json {}"), "```json {}");
    }
}
