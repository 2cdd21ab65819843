//! docmaint command line

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docmaint::changelog::{self, ChangelogOptions, PullSource};
use docmaint::config::{self, Config};
use docmaint::toc::{self, TocOutcome};
use docmaint::{a11y, fix, github, metrics, readme, versions, workflows};

#[derive(Parser)]
#[command(name = "docmaint", version)]
#[command(about = "Maintenance jobs for documentation repositories")]
struct Cli {
    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/.docmaint.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check markdown files for accessibility problems
    A11y {
        /// Write a markdown report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// List every issue per file
        #[arg(long)]
        verbose: bool,
    },

    /// Check that version numbers agree across manifests and docs
    Versions,

    /// Collect GitHub Actions workflow metrics
    Metrics {
        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Repository slug (owner/name)
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: Option<String>,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Days of history to analyze
        #[arg(long)]
        days: Option<i64>,
    },

    /// Compile README.md from its template
    Readme,

    /// Autofix common markdown lint problems
    Fix {
        /// Files to fix (default: config list, else every markdown file)
        files: Vec<PathBuf>,

        /// Print diffs without writing; fail if anything would change
        #[arg(long)]
        check: bool,

        #[arg(long)]
        max_line_length: Option<usize>,
    },

    /// Add a release section to the changelog
    Changelog {
        #[arg(long, env = "CURRENT_VERSION", default_value = "v0.1.0")]
        release_version: String,

        /// Only include changes after this tag
        #[arg(long, env = "SINCE_TAG")]
        since_tag: Option<String>,

        /// Release date (default: today)
        #[arg(long, env = "RELEASE_DATE")]
        date: Option<String>,

        /// Rebuild from the whole history, keeping only the header.
        /// `FULL_REBUILD=true` does the same.
        #[arg(long)]
        full_rebuild: bool,

        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: Option<String>,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Generate or refresh a table of contents
    Toc {
        /// Markdown file to update
        file: PathBuf,

        #[arg(long)]
        min_depth: Option<usize>,

        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Validate GitHub Actions workflow files
    Workflows {
        /// Workflow directory (default: .github/workflows)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = cli.root;
    let mut cfg = config::load(&root, cli.config.as_deref())?;

    let ok = match cli.command {
        Commands::A11y { report, verbose } => run_a11y(&root, &cfg, report.as_deref(), verbose)?,
        Commands::Versions => run_versions(&root, &cfg)?,
        Commands::Metrics {
            output,
            repo,
            token,
            days,
        } => {
            if let Some(days) = days {
                cfg.metrics.period_days = days;
            }
            run_metrics(&root, &cfg, output, repo, token.as_deref())?
        }
        Commands::Readme => {
            let stats = readme::run(&root, &cfg)?;
            readme::print_summary(&stats);
            true
        }
        Commands::Fix {
            files,
            check,
            max_line_length,
        } => {
            if let Some(n) = max_line_length {
                cfg.fix.max_line_length = n;
            }
            fix::run(&root, &files, &cfg.fix, check).passed()
        }
        Commands::Changelog {
            release_version,
            since_tag,
            date,
            full_rebuild,
            repo,
            token,
        } => {
            let opts = ChangelogOptions {
                version: release_version,
                since_tag: since_tag.filter(|t| !t.is_empty()),
                date: date
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| Local::now().date_naive().to_string()),
                full_rebuild: full_rebuild
                    || changelog::switch_enabled(std::env::var("FULL_REBUILD").ok().as_deref()),
            };
            run_changelog(&root, &cfg, &opts, repo, token.as_deref())?
        }
        Commands::Toc {
            file,
            min_depth,
            max_depth,
        } => run_toc(
            &root.join(file),
            min_depth.unwrap_or(cfg.toc.min_depth),
            max_depth.unwrap_or(cfg.toc.max_depth),
        )?,
        Commands::Workflows { dir, strict, json } => {
            let dir = root.join(dir.unwrap_or_else(|| PathBuf::from(&cfg.workflows.dir)));
            run_workflows(&root, &dir, strict || cfg.workflows.strict, json)?
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_a11y(root: &Path, cfg: &Config, report_path: Option<&Path>, verbose: bool) -> Result<bool> {
    println!("🔍 Checking markdown files for accessibility issues...");
    let report = a11y::run(root, &cfg.a11y);
    a11y::print_summary(&report, verbose);
    if let Some(path) = report_path {
        a11y::write_report(&report, path)?;
        println!("📄 Report written to {}", path.display());
    }
    Ok(report.is_clean())
}

fn run_versions(root: &Path, cfg: &Config) -> Result<bool> {
    println!("🔍 Checking version consistency across repository...");
    let audit = versions::audit(root, &cfg.versions);
    versions::save_results(&audit, &root.join(&cfg.versions.results_file))?;
    versions::print_summary(&audit);
    Ok(audit.consistent)
}

fn run_metrics(
    root: &Path,
    cfg: &Config,
    output: Option<PathBuf>,
    repo: Option<String>,
    token: Option<&str>,
) -> Result<bool> {
    let repo = repo.filter(|r| !r.is_empty()).or_else(|| cfg.repository());
    let client = github::Client::new(&cfg.github, token)?;
    metrics::run(root, &cfg.metrics, &client, repo.as_deref(), output, Utc::now())?;
    Ok(true)
}

fn run_changelog(
    root: &Path,
    cfg: &Config,
    opts: &ChangelogOptions,
    repo: Option<String>,
    token: Option<&str>,
) -> Result<bool> {
    let repo = repo.filter(|r| !r.is_empty()).or_else(|| cfg.repository());
    let client = match (token.filter(|t| !t.trim().is_empty()), &repo) {
        (Some(token), Some(_)) => Some(github::Client::new(&cfg.github, Some(token))?),
        _ => None,
    };
    let pulls = client
        .as_ref()
        .zip(repo.as_deref())
        .map(|(c, r)| (c as &dyn PullSource, r));

    let outcome = changelog::run(root, cfg, opts, pulls)
        .context("error generating changelog")?;
    if outcome == changelog::ChangelogOutcome::UpToDate {
        println!("ℹ️  Changelog is already up to date");
    }
    Ok(true)
}

fn run_toc(path: &Path, min_depth: usize, max_depth: usize) -> Result<bool> {
    let name = path.display();
    match toc::process_file(path, min_depth, max_depth)? {
        TocOutcome::Updated { entries } => {
            println!("✅ Updated table of contents in {name} ({entries} headings)");
        }
        TocOutcome::AlreadyCurrent => {
            println!("ℹ️  Table of contents in {name} is already up to date");
        }
        TocOutcome::NoHeadings => println!("⚠️  No headings found in {name}"),
        TocOutcome::NothingInRange => {
            println!("⚠️  No headings between levels {min_depth} and {max_depth} in {name}");
        }
    }
    Ok(true)
}

fn run_workflows(root: &Path, dir: &Path, strict: bool, json: bool) -> Result<bool> {
    let reports = workflows::validate_dir(root, dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        workflows::print_text(&reports, strict);
    }
    Ok(workflows::all_pass(&reports, strict))
}
