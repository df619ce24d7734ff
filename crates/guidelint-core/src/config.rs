use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GuidelintError;

/// Top-level configuration loaded from `.guidelint.toml`.
///
/// Supports layered resolution: CLI flags > env vars > config file > defaults.
///
/// # Examples
///
/// ```
/// use guidelint_core::GuidelintConfig;
///
/// let config = GuidelintConfig::default();
/// assert_eq!(config.review.batch_budget, 100);
/// assert!(config.guidelines.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuidelintConfig {
    /// Guideline document or directory of `.md` documents.
    pub guidelines: Option<PathBuf>,
    /// LLM endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

impl GuidelintConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GuidelintError::Io`] if the file cannot be read, or
    /// [`GuidelintError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, GuidelintError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GuidelintError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use guidelint_core::GuidelintConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// batch_budget = 250
    /// "#;
    /// let config = GuidelintConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.batch_budget, 250);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, GuidelintError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// OpenAI-compatible chat completion endpoint settings.
///
/// # Examples
///
/// ```
/// use guidelint_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o");
/// assert_eq!(config.seed, 1234);
/// assert_eq!(config.timeout_secs, 60);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL; requests go to `{base_url}/chat/completions`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer credential.
    pub api_key: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Fixed sampling seed.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Nucleus sampling cutoff.
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds. Requests are never retried.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_seed() -> u64 {
    1234
}

fn default_top_p() -> f64 {
    0.5
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            seed: default_seed(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use guidelint_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.batch_budget, 100);
/// assert_eq!(config.context_lines, 5);
/// assert_eq!(config.max_files, 0);
/// assert_eq!(config.fail_on, vec!["critical".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Maximum added+removed lines per request (default: 100).
    #[serde(default = "default_batch_budget")]
    pub batch_budget: usize,
    /// Lines shown before and after each changed line (default: 5).
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    /// Cap on reviewed files, 0 for unlimited.
    #[serde(default)]
    pub max_files: usize,
    /// Attach source windows around changed lines (default: true).
    #[serde(default = "default_true")]
    pub enrich_context: bool,
    /// Also review staged-but-uncommitted content (default: true).
    #[serde(default = "default_true")]
    pub include_staged: bool,
    /// Additional glob patterns to skip before sending to the model.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Severities that make the process exit with status 1.
    #[serde(default = "default_fail_on")]
    pub fail_on: Vec<String>,
}

fn default_batch_budget() -> usize {
    100
}

fn default_context_lines() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_fail_on() -> Vec<String> {
    vec!["critical".into()]
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            batch_budget: default_batch_budget(),
            context_lines: default_context_lines(),
            max_files: 0,
            enrich_context: true,
            include_staged: true,
            skip_patterns: Vec::new(),
            fail_on: default_fail_on(),
        }
    }
}

impl ReviewConfig {
    /// Whether `severity` is one of the exit-code-triggering labels
    /// (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Examples
    ///
    /// ```
    /// use guidelint_core::ReviewConfig;
    ///
    /// let config = ReviewConfig::default();
    /// assert!(config.fails_on(" Critical "));
    /// assert!(!config.fails_on("issue"));
    /// ```
    pub fn fails_on(&self, severity: &str) -> bool {
        let severity = severity.trim();
        self.fail_on
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(severity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = GuidelintConfig::default();
        assert_eq!(config.review.batch_budget, 100);
        assert_eq!(config.review.context_lines, 5);
        assert!(config.review.enrich_context);
        assert!(config.review.include_staged);
        assert!(config.review.skip_patterns.is_empty());
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.llm.top_p, 0.5);
        assert_eq!(config.llm.max_tokens, 8000);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = GuidelintConfig::from_toml("").unwrap();
        assert_eq!(config.review.batch_budget, 100);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.review.fail_on, vec!["critical"]);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
guidelines = "docs/guidelines"

[llm]
base_url = "http://localhost:11434/v1"
model = "qwen3"
temperature = 0.0
timeout_secs = 30

[review]
batch_budget = 50
context_lines = 3
max_files = 20
enrich_context = false
skip_patterns = ["**/*.test.ts"]
fail_on = ["issue", "suggestion(blocking)"]
"#;
        let config = GuidelintConfig::from_toml(toml).unwrap();
        assert_eq!(config.guidelines, Some(PathBuf::from("docs/guidelines")));
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.seed, 1234);
        assert_eq!(config.review.batch_budget, 50);
        assert_eq!(config.review.context_lines, 3);
        assert_eq!(config.review.max_files, 20);
        assert!(!config.review.enrich_context);
        assert!(config.review.include_staged);
        assert!(config.review.fails_on("Suggestion(Blocking)"));
        assert!(!config.review.fails_on("critical"));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = GuidelintConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(GuidelintError::Toml(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = GuidelintConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(GuidelintError::Io(_))));
    }
}
