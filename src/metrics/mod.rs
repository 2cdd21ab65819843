//! Workflow run statistics collected from the GitHub Actions API.
mod stats;

pub use stats::{WorkflowMetrics, calculate};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::MetricsConfig;
use crate::github::{self, GithubError, WorkflowRun};
use crate::output;

/// Where workflow runs come from.
pub trait RunSource {
    fn runs(
        &self,
        repo: &str,
        workflow: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkflowRun>, GithubError>;
}

impl RunSource for github::Client {
    fn runs(
        &self,
        repo: &str,
        workflow: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkflowRun>, GithubError> {
        self.workflow_runs(repo, workflow, since)
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsReport {
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub period_days: i64,
    /// Keyed by workflow file, in configured order.
    pub workflows: IndexMap<String, WorkflowMetrics>,
    pub summary: MetricsSummary,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MetricsSummary {
    pub total_workflows: usize,
    pub total_runs_all_workflows: usize,
    pub overall_success_rate: f64,
    pub avg_runs_per_workflow: f64,
}

/// Fetch and aggregate metrics for every configured workflow.
///
/// A workflow whose runs cannot be fetched is logged and counted as having
/// no runs.
pub fn collect(
    source: &impl RunSource,
    repo: &str,
    cfg: &MetricsConfig,
    now: DateTime<Utc>,
) -> MetricsReport {
    let since = now - Duration::days(cfg.period_days);
    let mut workflows = IndexMap::new();

    for workflow in &cfg.workflows {
        tracing::info!("analyzing {workflow}");
        let runs = match source.runs(repo, workflow, since) {
            Ok(runs) => runs,
            Err(GithubError::RateLimited) => {
                tracing::warn!("rate limited while fetching {workflow}; consider setting GITHUB_TOKEN");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("error fetching workflow runs for {workflow}: {e}");
                Vec::new()
            }
        };
        workflows.insert(workflow.clone(), calculate(&runs));
    }

    let summary = summarize(&workflows);
    MetricsReport {
        generated_at: now,
        repository: repo.to_string(),
        period_days: cfg.period_days,
        workflows,
        summary,
    }
}

pub fn summarize(workflows: &IndexMap<String, WorkflowMetrics>) -> MetricsSummary {
    let total_runs: usize = workflows.values().map(|w| w.total_runs).sum();
    let successful: usize = workflows.values().map(|w| w.successful_runs).sum();
    let overall = if total_runs > 0 {
        successful as f64 / total_runs as f64 * 100.0
    } else {
        0.0
    };
    let avg_runs = if workflows.is_empty() {
        0.0
    } else {
        total_runs as f64 / workflows.len() as f64
    };

    MetricsSummary {
        total_workflows: workflows.len(),
        total_runs_all_workflows: total_runs,
        overall_success_rate: stats::round_to(overall, 1),
        avg_runs_per_workflow: stats::round_to(avg_runs, 1),
    }
}

/// Collect metrics for `repo`, write the JSON report, print the summary
/// and publish step outputs. The report goes to `output`, else to the
/// configured path under `root`.
pub fn run(
    root: &Path,
    cfg: &MetricsConfig,
    source: &impl RunSource,
    repo: Option<&str>,
    output: Option<PathBuf>,
    now: DateTime<Utc>,
) -> Result<MetricsReport> {
    let Some(repo) = repo.map(str::trim).filter(|r| !r.is_empty()) else {
        bail!("GITHUB_REPOSITORY environment variable or `repository` config is required");
    };
    println!("📊 Collecting workflow metrics for {repo}");

    let report = collect(source, repo, cfg, now);
    let path = output.unwrap_or_else(|| root.join(&cfg.output));
    write_report(&report, &path)?;
    print_summary(&report);
    publish_outputs(&report)?;
    Ok(report)
}

pub fn write_report(report: &MetricsReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("metrics report generated: {}", path.display());
    Ok(())
}

/// Publish the headline numbers as CI step outputs when inside Actions.
pub fn publish_outputs(report: &MetricsReport) -> Result<()> {
    if !output::in_actions() {
        return Ok(());
    }
    output::publish(&[
        (
            "overall_success_rate",
            report.summary.overall_success_rate.to_string(),
        ),
        (
            "total_runs",
            report.summary.total_runs_all_workflows.to_string(),
        ),
    ])
}

pub fn print_summary(report: &MetricsReport) {
    let summary = &report.summary;
    println!("\n📈 Workflow Metrics Summary");
    println!("{}", "=".repeat(50));
    println!("Repository: {}", report.repository);
    println!("Period: {} days", report.period_days);
    println!("Total workflows: {}", summary.total_workflows);
    println!("Total runs: {}", summary.total_runs_all_workflows);
    println!("Overall success rate: {}%", summary.overall_success_rate);
    println!();
    println!("Per-Workflow Breakdown:");
    println!("{}", "-".repeat(30));

    for (name, data) in &report.workflows {
        let marker = match data.latest_status.as_str() {
            "success" => "✅",
            "failure" => "❌",
            _ => "⚠️",
        };
        println!("{marker} {name}");
        println!(
            "   Runs: {} | Success Rate: {}% | Avg Duration: {}min",
            data.total_runs, data.success_rate, data.avg_duration_minutes
        );
    }
    println!();
}
