use std::path::PathBuf;
use std::time::Duration;

use guidelint_core::{Batch, ChangedFile, ReviewComment, ReviewResponse};
use guidelint_difflens::batch::create_batches;
use guidelint_difflens::context::{self, DEFAULT_RADIUS};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::prompt::{self, EnrichedFile};

/// Result of a completed code review.
///
/// # Examples
///
/// ```
/// use guidelint_review::pipeline::{ReviewOutcome, ReviewStats};
///
/// let outcome = ReviewOutcome {
///     comments: vec![],
///     summaries: vec!["No violations found".into()],
///     stats: ReviewStats {
///         model_used: "gpt-4o".into(),
///         ..ReviewStats::default()
///     },
/// };
/// assert!(outcome.comments.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// Comments from every successful batch, in batch order.
    pub comments: Vec<ReviewComment>,
    /// One model summary per successful batch.
    pub summaries: Vec<String>,
    /// Statistics about the review run.
    pub stats: ReviewStats,
}

/// Statistics about a review run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Number of files sent for review.
    pub files_reviewed: usize,
    /// Number of batches built.
    pub batches: usize,
    /// Batches whose request or response failed.
    pub batches_failed: usize,
    /// Files that got context windows attached.
    pub files_enriched: usize,
    /// Model identifier used for the review.
    pub model_used: String,
}

/// Knobs for a review run.
#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Changed-line budget per request.
    pub batch_budget: usize,
    /// Lines of context on each side of a changed line.
    pub context_lines: u32,
    /// Attach context windows. Should already account for grammar support.
    pub enrich: bool,
    /// Write each batch prompt to this file, overwriting it.
    pub prompt_log: Option<PathBuf>,
    /// Show a spinner on stderr while a request is in flight.
    pub show_progress: bool,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            batch_budget: 100,
            context_lines: DEFAULT_RADIUS,
            enrich: true,
            prompt_log: None,
            show_progress: false,
        }
    }
}

/// Review orchestrator: batch, enrich, prompt, dispatch, parse.
///
/// Batches run one after another. A batch that fails contributes no
/// comments and the run continues with the next one.
pub struct ReviewPipeline {
    llm: LlmClient,
    guidelines: String,
    repo: PathBuf,
    options: ReviewOptions,
}

impl ReviewPipeline {
    /// Create a pipeline for the repository at `repo`.
    pub fn new(
        llm: LlmClient,
        guidelines: String,
        repo: impl Into<PathBuf>,
        options: ReviewOptions,
    ) -> Self {
        Self {
            llm,
            guidelines,
            repo: repo.into(),
            options,
        }
    }

    /// Review already filtered files.
    pub async fn review(&self, files: Vec<ChangedFile>) -> ReviewOutcome {
        let mut outcome = ReviewOutcome {
            stats: ReviewStats {
                files_reviewed: files.len(),
                model_used: self.llm.model().to_string(),
                ..ReviewStats::default()
            },
            ..ReviewOutcome::default()
        };

        let batches = create_batches(files, self.options.batch_budget);
        outcome.stats.batches = batches.len();
        info!("\u{1f4e6} Created {} batch(es) for review", batches.len());

        for (i, batch) in batches.iter().enumerate() {
            info!(
                "\u{1f504} Processing batch {}/{} ({} file(s), {} total changes)",
                i + 1,
                batches.len(),
                batch.files.len(),
                batch.total_changes
            );

            let enriched = self.enrich_batch(batch);
            outcome.stats.files_enriched += enriched
                .iter()
                .filter(|f| f.context.as_ref().is_some_and(|ctx| !ctx.is_empty()))
                .count();

            match self.review_batch(&enriched).await {
                Some(response) => {
                    info!("  \u{2514}\u{2500} Found {} issue(s) in this batch", response.comments.len());
                    outcome.comments.extend(response.comments);
                    outcome.summaries.push(response.summary);
                }
                None => outcome.stats.batches_failed += 1,
            }
        }

        outcome
    }

    fn enrich_batch(&self, batch: &Batch) -> Vec<EnrichedFile> {
        batch
            .files
            .iter()
            .map(|file| {
                info!("  \u{1f4c4} {} (+{} -{})", file.new_path, file.additions, file.deletions);
                if !self.options.enrich {
                    return EnrichedFile::bare(file.clone());
                }
                match context::enrich(&self.repo, file, self.options.context_lines) {
                    Ok((file, ctx)) => EnrichedFile {
                        file,
                        context: Some(ctx),
                    },
                    Err(e) => {
                        warn!("  \u{26a0}\u{fe0f} Failed to enrich context for {}: {e}", file.new_path);
                        EnrichedFile::bare(file.clone())
                    }
                }
            })
            .collect()
    }

    async fn review_batch(&self, files: &[EnrichedFile]) -> Option<ReviewResponse> {
        let prompt = prompt::build_batch_prompt(&self.guidelines, files);

        if let Some(path) = &self.options.prompt_log {
            if let Err(e) = std::fs::write(path, &prompt) {
                warn!("could not write prompt log {}: {e}", path.display());
            }
        }

        let spinner = self.spinner(files.len());
        let result = self.llm.review(&prompt).await;

        match result {
            Ok(raw) => {
                if let Some(pb) = spinner {
                    pb.finish_and_clear();
                }
                Some(prompt::parse_review_response(&raw))
            }
            Err(e) => {
                if let Some(pb) = spinner {
                    pb.finish_with_message("Failed");
                }
                warn!("  \u{274c} Batch review failed: {e}");
                None
            }
        }
    }

    fn spinner(&self, files: usize) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
            pb.set_style(style);
        }
        pb.set_message(format!("Reviewing {files} file(s) with {}...", self.llm.model()));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use guidelint_core::LlmConfig;

    use super::*;

    fn offline_pipeline(repo: &std::path::Path, options: ReviewOptions) -> ReviewPipeline {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".into(),
            model: "offline".into(),
            timeout_secs: 5,
            ..LlmConfig::default()
        };
        let llm = LlmClient::new(&config).unwrap();
        ReviewPipeline::new(llm, "rules".into(), repo, options)
    }

    #[tokio::test]
    async fn failed_batches_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReviewOptions {
            batch_budget: 10,
            enrich: false,
            ..ReviewOptions::default()
        };
        let files = vec![
            ChangedFile::new("a.ts", "+a", 8, 0),
            ChangedFile::new("b.ts", "+b", 8, 0),
        ];

        let outcome = offline_pipeline(dir.path(), options).review(files).await;
        assert!(outcome.comments.is_empty());
        assert!(outcome.summaries.is_empty());
        assert_eq!(outcome.stats.files_reviewed, 2);
        assert_eq!(outcome.stats.batches, 2);
        assert_eq!(outcome.stats.batches_failed, 2);
        assert_eq!(outcome.stats.model_used, "offline");
    }

    #[tokio::test]
    async fn prompt_log_holds_last_batch() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("prompt.md");
        let options = ReviewOptions {
            batch_budget: 1,
            enrich: false,
            prompt_log: Some(log.clone()),
            ..ReviewOptions::default()
        };
        let files = vec![
            ChangedFile::new("first.ts", "+1", 1, 0),
            ChangedFile::new("second.ts", "+2", 1, 0),
        ];

        offline_pipeline(dir.path(), options).review(files).await;
        let written = std::fs::read_to_string(log).unwrap();
        assert!(written.contains("### File 1: second.ts"));
        assert!(!written.contains("first.ts"));
    }

    #[test]
    fn enrichment_failure_falls_back_to_bare_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.ts"), "a\nb\n").unwrap();
        let pipeline = offline_pipeline(dir.path(), ReviewOptions::default());
        let batch = Batch {
            files: vec![
                ChangedFile::new("missing.ts", "@@ -0,0 +1 @@\n+x\n", 1, 0),
                ChangedFile::new("present.ts", "@@ -1 +1,2 @@\n a\n+b\n", 1, 0),
            ],
            total_changes: 2,
        };

        let enriched = pipeline.enrich_batch(&batch);
        assert!(enriched[0].context.is_none());
        assert!(enriched[0].file.language.is_none());
        let ctx = enriched[1].context.as_ref().unwrap();
        assert_eq!(ctx.changed_lines, vec![2]);
    }

    #[tokio::test]
    async fn removal_only_files_are_not_counted_as_enriched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kept.ts"), "a\nb\n").unwrap();
        let files = vec![
            ChangedFile::new("gone.ts", "@@ -1,2 +1 @@\n a\n-b\n", 0, 1),
            ChangedFile::new("kept.ts", "@@ -1 +1,2 @@\n a\n+b\n", 1, 0),
        ];

        let outcome = offline_pipeline(dir.path(), ReviewOptions::default()).review(files).await;
        assert_eq!(outcome.stats.files_reviewed, 2);
        assert_eq!(outcome.stats.files_enriched, 1);
    }
}
