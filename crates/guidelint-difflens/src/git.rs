//! Change enumeration through the `git` command-line tool.
//!
//! Every invocation runs as `git -C <repo> ...`, one process at a time. Any
//! failing invocation aborts enumeration with [`GuidelintError::Git`].

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

use guidelint_core::{ChangedFile, ComparisonMode, GuidelintError};
use tracing::debug;

use crate::parser::count_changes;

/// Enumerate changed files for `mode`, sorted by new path.
///
/// Paths whose diff is blank are dropped. With `include_staged`, paths that
/// are only staged are listed as well.
///
/// # Errors
///
/// Returns [`GuidelintError::Git`] if any git command fails.
pub fn changed_files(
    repo: &Path,
    mode: &ComparisonMode,
    include_staged: bool,
) -> Result<Vec<ChangedFile>, GuidelintError> {
    let mut files = match mode {
        ComparisonMode::Local(branch) => enumerate_local(repo, branch, include_staged)?,
        ComparisonMode::AgainstMergeBase(branch) => {
            enumerate_since_merge_base(repo, branch, include_staged)?
        }
        ComparisonMode::AgainstRef(rev) => enumerate_against_ref(repo, rev, include_staged)?,
    };
    files.sort_by(|a, b| a.new_path.cmp(&b.new_path));
    Ok(files)
}

/// Working tree (staged and unstaged) against a named branch.
fn enumerate_local(
    repo: &Path,
    branch: &str,
    include_staged: bool,
) -> Result<Vec<ChangedFile>, GuidelintError> {
    collect(repo, &[branch], include_staged, false)
}

/// Only the commits made on HEAD since it diverged from `branch`.
fn enumerate_since_merge_base(
    repo: &Path,
    branch: &str,
    include_staged: bool,
) -> Result<Vec<ChangedFile>, GuidelintError> {
    let base = merge_base(repo, branch)?;
    debug!("merge base of {branch} and HEAD is {base}");
    collect(repo, &[base.as_str(), "HEAD"], include_staged, true)
}

/// Working tree against a ref.
fn enumerate_against_ref(
    repo: &Path,
    rev: &str,
    include_staged: bool,
) -> Result<Vec<ChangedFile>, GuidelintError> {
    collect(repo, &[rev], include_staged, false)
}

/// `revs` is the revision part of `git diff`. `prefix_staged` adds the
/// staged diff on top of HEAD, for comparisons that do not look at the
/// working tree.
fn collect(
    repo: &Path,
    revs: &[&str],
    include_staged: bool,
    prefix_staged: bool,
) -> Result<Vec<ChangedFile>, GuidelintError> {
    let mut args = vec!["diff", "--name-only", "-z"];
    args.extend_from_slice(revs);
    let mut names = parse_names(&run_git(repo, &args)?);

    if include_staged {
        names.extend(parse_names(&run_git(repo, &["diff", "--cached", "--name-only", "-z"])?));
    }

    let mut files = Vec::new();
    for path in dedup(names) {
        let mut diff = String::new();
        if include_staged && prefix_staged {
            diff.push_str(&run_git(repo, &["diff", "--cached", "HEAD", "--", path.as_str()])?);
        }

        let mut args = vec!["diff"];
        args.extend_from_slice(revs);
        args.extend_from_slice(&["--", path.as_str()]);
        diff.push_str(&run_git(repo, &args)?);

        if diff.trim().is_empty() {
            debug!("no diff for {path}, skipping");
            continue;
        }

        let (additions, deletions) = count_changes(&diff);
        files.push(ChangedFile::new(path, diff, additions, deletions));
    }

    Ok(files)
}

/// Common ancestor of `branch` and HEAD.
///
/// # Errors
///
/// Returns [`GuidelintError::Git`] if git fails or prints nothing.
pub fn merge_base(repo: &Path, branch: &str) -> Result<String, GuidelintError> {
    let out = run_git(repo, &["merge-base", branch, "HEAD"])?;
    let sha = out.trim();
    if sha.is_empty() {
        return Err(GuidelintError::Git(format!(
            "git merge-base {branch} HEAD returned no commit"
        )));
    }
    Ok(sha.to_string())
}

/// Content of `path` at revision `rev`.
///
/// # Errors
///
/// Returns [`GuidelintError::Git`] if the path does not exist at `rev`.
pub fn show_file(repo: &Path, rev: &str, path: &str) -> Result<String, GuidelintError> {
    run_git(repo, &["show", &format!("{rev}:{path}")])
}

fn run_git(repo: &Path, args: &[&str]) -> Result<String, GuidelintError> {
    debug!("git -C {} {}", repo.display(), args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .map_err(|e| GuidelintError::Git(format!("failed to run git {}: {e}", args.join(" "))))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GuidelintError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split `--name-only -z` output. Names are NUL-terminated and never quoted.
fn parse_names(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|n| !n.trim().is_empty())
        .map(String::from)
        .collect()
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_splits_on_nul() {
        let names = parse_names("src/a.ts\0caf\u{e9}.ts\0with \"quote\".ts\0\0");
        assert_eq!(names, vec!["src/a.ts", "caf\u{e9}.ts", "with \"quote\".ts"]);
    }

    #[test]
    fn parse_names_of_empty_output() {
        assert!(parse_names("").is_empty());
        assert!(parse_names("\n").is_empty());
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let names = vec!["b.ts".to_string(), "a.ts".into(), "b.ts".into(), "c.ts".into(), "a.ts".into()];
        assert_eq!(dedup(names), vec!["b.ts", "a.ts", "c.ts"]);
    }

    #[test]
    fn missing_repository_is_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = changed_files(&missing, &ComparisonMode::AgainstRef("HEAD".into()), false);
        assert!(matches!(result, Err(GuidelintError::Git(_))));
    }
}
