use guidelint_core::GuidelintError;

/// Added and removed line counts of a unified diff.
///
/// `+++` / `---` file headers are not counted.
///
/// # Examples
///
/// ```
/// use guidelint_difflens::parser::count_changes;
///
/// let diff = "--- a/x.ts\n+++ b/x.ts\n@@ -1,2 +1,2 @@\n-old\n+new\n same\n";
/// assert_eq!(count_changes(diff), (1, 1));
/// ```
pub fn count_changes(diff: &str) -> (usize, usize) {
    let mut additions = 0;
    let mut deletions = 0;
    for line in diff.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            deletions += 1;
        }
    }
    (additions, deletions)
}

/// Post-change line numbers of every added line in a unified diff.
///
/// Each hunk header resets the running counter to the new-side start line;
/// added lines are recorded and advance the counter, context lines only
/// advance it, removed lines leave it alone. A malformed hunk header keeps
/// the previous counter.
///
/// # Examples
///
/// ```
/// use guidelint_difflens::parser::parse_changed_lines;
///
/// let diff = "@@ -10,3 +10,4 @@\n context\n+added\n context\n";
/// assert_eq!(parse_changed_lines(diff), vec![11]);
/// ```
pub fn parse_changed_lines(diff: &str) -> Vec<u32> {
    let mut changed = Vec::new();
    let mut current: u32 = 0;

    for line in diff.lines() {
        if line.starts_with("@@") {
            if let Ok((_, _, new_start, _)) = parse_hunk_header(line) {
                current = new_start;
            }
            continue;
        }

        if line.starts_with('+') && !line.starts_with("+++") {
            changed.push(current);
            current += 1;
        } else if line.starts_with(' ') {
            current += 1;
        }
    }

    changed
}

/// Parse `@@ -a,b +c,d @@` into `(a, b, c, d)`; counts default to 1.
///
/// # Errors
///
/// Returns [`GuidelintError::Parse`] if the header is malformed.
///
/// # Examples
///
/// ```
/// use guidelint_difflens::parser::parse_hunk_header;
///
/// assert_eq!(parse_hunk_header("@@ -1 +1,2 @@ fn main()").unwrap(), (1, 1, 1, 2));
/// assert!(parse_hunk_header("@@ nonsense @@").is_err());
/// ```
pub fn parse_hunk_header(line: &str) -> Result<(u32, u32, u32, u32), GuidelintError> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(|| GuidelintError::Parse(format!("invalid hunk header: {line}")))?;

    let parts: Vec<&str> = inner.split(' ').collect();
    if parts.len() != 2 {
        return Err(GuidelintError::Parse(format!("invalid hunk header: {line}")));
    }

    let old = parts[0]
        .strip_prefix('-')
        .ok_or_else(|| GuidelintError::Parse(format!("invalid old range in hunk: {line}")))?;
    let new = parts[1]
        .strip_prefix('+')
        .ok_or_else(|| GuidelintError::Parse(format!("invalid new range in hunk: {line}")))?;

    let (old_start, old_lines) = parse_range(old, line)?;
    let (new_start, new_lines) = parse_range(new, line)?;

    Ok((old_start, old_lines, new_start, new_lines))
}

fn parse_range(range: &str, context: &str) -> Result<(u32, u32), GuidelintError> {
    if let Some((start, count)) = range.split_once(',') {
        let s = start
            .parse()
            .map_err(|_| GuidelintError::Parse(format!("invalid range number in: {context}")))?;
        let c = count
            .parse()
            .map_err(|_| GuidelintError::Parse(format!("invalid range count in: {context}")))?;
        Ok((s, c))
    } else {
        let s = range
            .parse()
            .map_err(|_| GuidelintError::Parse(format!("invalid range number in: {context}")))?;
        Ok((s, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_has_no_changes() {
        assert!(parse_changed_lines("").is_empty());
        assert_eq!(count_changes(""), (0, 0));
    }

    #[test]
    fn added_line_after_context() {
        let diff = "\
@@ -10,3 +10,4 @@
 const a = 1;
+const b = 2;
 const c = 3;
";
        assert_eq!(parse_changed_lines(diff), vec![11]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let diff = "@@ -1,2 +1,3 @@\n a\n+b\n+c\n";
        let first = parse_changed_lines(diff);
        let second = parse_changed_lines(diff);
        assert_eq!(first, second);
        assert_eq!(first, vec![2, 3]);
    }

    #[test]
    fn removed_lines_do_not_advance() {
        let diff = "\
@@ -5,3 +5,3 @@
 keep
-gone
+replacement
 keep
";
        assert_eq!(parse_changed_lines(diff), vec![6]);
    }

    #[test]
    fn file_headers_are_ignored() {
        let diff = "\
diff --git a/src/a.ts b/src/a.ts
index 1234567..89abcde 100644
--- a/src/a.ts
+++ b/src/a.ts
@@ -1,2 +1,3 @@
 import x from 'x';
+import y from 'y';
 export {};
";
        assert_eq!(parse_changed_lines(diff), vec![2]);
        assert_eq!(count_changes(diff), (1, 0));
    }

    #[test]
    fn multiple_hunks_reset_the_counter() {
        let diff = "\
@@ -1,2 +1,3 @@
 a
+b
 c
@@ -20,2 +21,3 @@
 x
+y
 z
";
        assert_eq!(parse_changed_lines(diff), vec![2, 22]);
    }

    #[test]
    fn hunk_header_without_counts() {
        let diff = "@@ -1 +1 @@\n-old\n+new\n";
        assert_eq!(parse_changed_lines(diff), vec![1]);
    }

    #[test]
    fn new_file_numbers_from_one() {
        let diff = "\
--- /dev/null
+++ b/new.ts
@@ -0,0 +1,3 @@
+export function hello() {
+  return 1;
+}
";
        assert_eq!(parse_changed_lines(diff), vec![1, 2, 3]);
        assert_eq!(count_changes(diff), (3, 0));
    }

    #[test]
    fn no_newline_marker_is_ignored() {
        let diff = "@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n\\ No newline at end of file\n";
        assert_eq!(parse_changed_lines(diff), vec![1]);
        assert_eq!(count_changes(diff), (1, 1));
    }

    #[test]
    fn malformed_header_keeps_counter() {
        let diff = "@@ -1,1 +4,2 @@\n+a\n@@ garbage @@\n+b\n";
        assert_eq!(parse_changed_lines(diff), vec![4, 5]);
    }

    #[test]
    fn hunk_header_errors() {
        assert!(parse_hunk_header("@@ -x +1 @@").is_err());
        assert!(parse_hunk_header("@@ -1 1 @@").is_err());
        assert!(parse_hunk_header("no header").is_err());
    }
}
