use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use guidelint_core::{ComparisonMode, GuidelintConfig, OutputFormat};
use guidelint_difflens::context::DEFAULT_RADIUS;
use guidelint_difflens::filter::EligibilityFilter;
use guidelint_difflens::git::changed_files;
use guidelint_difflens::syntax::SyntaxSupport;
use guidelint_review::guidelines::load_guidelines;
use guidelint_review::llm::LlmClient;
use guidelint_review::pipeline::{ReviewOptions, ReviewOutcome, ReviewPipeline, ReviewStats};
use guidelint_review::render::{render_text, to_markdown};

const CONFIG_FILE: &str = ".guidelint.toml";

#[derive(Parser)]
#[command(
    name = "guidelint",
    version,
    about = "Guideline-driven AI code review for your git changes",
    long_about = "guidelint reviews the TypeScript/JavaScript changes in a git repository against\n\
                   your own Markdown guidelines, using any OpenAI-compatible chat endpoint.\n\n\
                   Examples:\n  \
                     guidelint init                                  Create a .guidelint.toml\n  \
                     guidelint review --guidelines rules/            Review uncommitted changes\n  \
                     guidelint review --target-branch main           Review commits since main\n  \
                     guidelint review --format json --fail-on issue  CI-friendly output"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .guidelint.toml in the reviewed repository)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for review results.\n\n\
                       Formats:\n  \
                         text      Grouped, colored terminal report (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,

    /// Log filter, in tracing-subscriber EnvFilter syntax
    #[arg(
        long,
        global = true,
        env = "GUIDELINT_LOG",
        default_value = "info",
        hide_default_value = true,
        hide_env = true
    )]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Review changed files against your guidelines
    #[command(long_about = "Review changed files against your guidelines.\n\n\
        Lists the changed files of the repository, keeps the .ts/.tsx/.js/.jsx sources,\n\
        groups them into batches of at most --batch-budget changed lines and sends each\n\
        batch with its guidelines to the model. Failed batches are skipped.\n\n\
        Comparison:\n  \
          --target-branch HEAD (default)  working tree against HEAD\n  \
          --target-branch main            commits made since diverging from main\n  \
          --target-branch main --local    working tree against main\n\n\
        Examples:\n  guidelint review --guidelines docs/guidelines\n  \
        guidelint review --target-branch main --fail-on 'suggestion(blocking)'")]
    Review(ReviewArgs),
    /// Create a default .guidelint.toml configuration file
    #[command(long_about = "Create a default .guidelint.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .guidelint.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct ReviewArgs {
    /// API key for the chat endpoint (falls back to OPENAI_API_KEY)
    #[arg(long, env = "GUIDELINT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "GUIDELINT_ENDPOINT")]
    endpoint: Option<String>,

    /// Model name
    #[arg(long, env = "GUIDELINT_MODEL")]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "GUIDELINT_TEMPERATURE")]
    temperature: Option<f64>,

    /// Guideline .md file or directory of .md files
    #[arg(long, env = "GUIDELINT_GUIDELINES")]
    guidelines: Option<PathBuf>,

    /// Repository path
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Branch or ref to compare against
    #[arg(long, env = "TARGET_BRANCH", default_value = "HEAD")]
    target_branch: String,

    /// Compare the working tree directly against --target-branch
    #[arg(long, env = "GUIDELINT_LOCAL")]
    local: bool,

    /// Attach source windows around changed lines
    #[arg(long, env = "GUIDELINT_CONTEXT")]
    context: Option<bool>,

    /// Also review staged changes
    #[arg(long)]
    include_staged: Option<bool>,

    /// Review at most this many files (0 = no limit)
    #[arg(long)]
    max_files: Option<usize>,

    /// Maximum changed lines per request
    #[arg(long)]
    batch_budget: Option<usize>,

    /// Additional glob patterns to skip (e.g. "*.test.ts")
    #[arg(long)]
    skip_pattern: Vec<String>,

    /// Exit with status 1 when a comment has this severity (repeatable)
    #[arg(
        long,
        long_help = "Exit with status 1 when any comment carries this severity.\n\n\
            Matched case-insensitively against the whole severity label.\n\
            Repeatable; replaces review.fail_on from the config file (default: critical)."
    )]
    fail_on: Vec<String>,

    /// Write each batch prompt to this file
    #[arg(long)]
    prompt_log: Option<PathBuf>,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[33m\u{1f4cf}\x1b[0m \x1b[1mguidelint\x1b[0m v{version}: AI code review against your own guidelines\n");

        println!("Quick start:");
        println!("  \x1b[36mguidelint init\x1b[0m                          Create a .guidelint.toml config file");
        println!("  \x1b[36mguidelint review --guidelines rules/\x1b[0m    Review your uncommitted changes\n");

        println!("All commands:");
        println!("  \x1b[32mreview\x1b[0m    Review changed files against guidelines");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("guidelint v{version}: AI code review against your own guidelines\n");

        println!("Quick start:");
        println!("  guidelint init                          Create a .guidelint.toml config file");
        println!("  guidelint review --guidelines rules/    Review your uncommitted changes\n");

        println!("All commands:");
        println!("  review    Review changed files against guidelines");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'guidelint <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# guidelint configuration

# Markdown guideline file, or a directory whose *.md files are all loaded
# guidelines = "docs/guidelines"

[llm]
# OpenAI-compatible endpoint; requests go to {base_url}/chat/completions
# base_url = "https://api.openai.com/v1"
# model = "gpt-4o"
# api_key = "..."            # prefer GUIDELINT_API_KEY or OPENAI_API_KEY
# temperature = 0.1
# seed = 1234
# top_p = 0.5
# max_tokens = 8000
# timeout_secs = 60

[review]
# batch_budget = 100         # changed lines per request
# context_lines = 5          # lines shown around each changed line
# max_files = 0              # 0 = no limit
# enrich_context = true
# include_staged = true
# skip_patterns = ["**/__generated__/**", "*.test.ts"]
# fail_on = ["critical"]     # severities that make the exit status 1
"#;

/// Load `path`, or `.guidelint.toml` at the root of `repo` when no path is
/// given. A relative `guidelines` entry is taken relative to the file that
/// names it.
fn load_config(path: Option<&Path>, repo: &Path) -> Result<GuidelintConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = repo.join(CONFIG_FILE);
            if !default_path.exists() {
                return Ok(GuidelintConfig::default());
            }
            default_path
        }
    };

    let mut config = GuidelintConfig::from_file(&path)
        .wrap_err_with(|| format!("failed to load {}", path.display()))?;
    if let (Some(guidelines), Some(dir)) = (&config.guidelines, path.parent()) {
        if guidelines.is_relative() {
            config.guidelines = Some(dir.join(guidelines));
        }
    }
    debug!("loaded config from {}", path.display());
    Ok(config)
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Fold CLI flags (which already include their env fallbacks) over the
/// loaded config.
fn apply_overrides(config: &mut GuidelintConfig, args: &ReviewArgs) {
    let llm = &mut config.llm;
    if let Some(key) = &args.api_key {
        llm.api_key = Some(key.clone());
    }
    if llm.api_key.is_none() {
        llm.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
    }
    if let Some(endpoint) = &args.endpoint {
        llm.base_url = endpoint.clone();
    }
    if let Some(model) = &args.model {
        llm.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        llm.temperature = temperature;
    }

    if args.guidelines.is_some() {
        config.guidelines = args.guidelines.clone();
    }

    let review = &mut config.review;
    if let Some(context) = args.context {
        review.enrich_context = context;
    }
    if let Some(staged) = args.include_staged {
        review.include_staged = staged;
    }
    if let Some(max) = args.max_files {
        review.max_files = max;
    }
    if let Some(budget) = args.batch_budget {
        review.batch_budget = budget;
    }
    review.skip_patterns.extend(args.skip_pattern.iter().cloned());
    if !args.fail_on.is_empty() {
        review.fail_on = args.fail_on.clone();
    }
}

async fn run_review(
    mut config: GuidelintConfig,
    args: &ReviewArgs,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    apply_overrides(&mut config, args);

    if config.llm.api_key.is_none() {
        miette::bail!(miette::miette!(
            help = "Pass --api-key, set GUIDELINT_API_KEY or OPENAI_API_KEY, or add api_key under [llm] in .guidelint.toml",
            "No API key configured for {}",
            config.llm.base_url
        ));
    }

    let Some(guidelines_path) = config.guidelines.clone() else {
        miette::bail!(miette::miette!(
            help = "Pass --guidelines <file.md|dir>, set GUIDELINT_GUIDELINES, or run 'guidelint init' and set `guidelines`",
            "No guidelines configured"
        ));
    };
    let guidelines = load_guidelines(&guidelines_path)?;

    let enrich_requested = config.review.enrich_context;
    let syntax = if enrich_requested {
        SyntaxSupport::probe()
    } else {
        SyntaxSupport::disabled()
    };
    let enrich = syntax.enrichment_enabled(enrich_requested);

    let mode = ComparisonMode::select(&args.target_branch, args.local);
    info!("Comparing {mode} in {}", args.repo.display());

    let files = changed_files(&args.repo, &mode, config.review.include_staged)?;
    info!("\u{1f4ca} Found {} changed files", files.len());

    let filtered = EligibilityFilter::from_config(&config.review).filter(files);
    for skipped in &filtered.skipped {
        debug!("skipped {}: {}", skipped.path, skipped.reason);
    }
    info!(
        "\u{1f50d} Filtered to {} TypeScript/JavaScript files for review",
        filtered.kept.len()
    );

    let outcome = if filtered.kept.is_empty() {
        ReviewOutcome {
            stats: ReviewStats {
                model_used: config.llm.model.clone(),
                ..ReviewStats::default()
            },
            ..ReviewOutcome::default()
        }
    } else {
        let llm = LlmClient::new(&config.llm)?;
        let options = ReviewOptions {
            batch_budget: config.review.batch_budget,
            context_lines: u32::try_from(config.review.context_lines).unwrap_or(DEFAULT_RADIUS),
            enrich,
            prompt_log: args.prompt_log.clone(),
            show_progress: std::io::stderr().is_terminal(),
        };
        ReviewPipeline::new(llm, guidelines, &args.repo, options)
            .review(filtered.kept)
            .await
    };

    match format {
        OutputFormat::Text => print!("{}", render_text(&outcome.comments, use_color)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", to_markdown(&outcome)),
    }

    let failing = outcome
        .comments
        .iter()
        .filter(|c| config.review.fails_on(&c.severity))
        .count();
    if failing > 0 {
        info!("{failing} comment(s) matched --fail-on, exiting with status 1");
        std::io::stdout().flush().into_diagnostic()?;
        std::process::exit(1);
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(if cli.verbose { "debug" } else { cli.log_level.as_str() });

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => print_welcome(use_color),
        Some(Command::Review(ref args)) => {
            let config = load_config(cli.config.as_deref(), &args.repo)?;
            debug!("format: {}", cli.format);
            run_review(config, args, cli.format, use_color).await?;
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!(miette::miette!(
                    help = "Edit the existing file or remove it first",
                    "{CONFIG_FILE} already exists"
                ));
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "guidelint", &mut std::io::stdout());
        }
    }

    Ok(())
}
