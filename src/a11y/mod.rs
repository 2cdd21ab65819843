//! Accessibility checks for markdown files: heading hierarchy, image alt
//! text and link text.
mod checks;

pub use checks::{check_alt_text, check_heading_hierarchy, check_link_text};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::A11yConfig;
use crate::markdown;

/// A single accessibility finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub rule: &'static str,
    pub message: String,
}

impl Issue {
    pub fn new(rule: &'static str, message: String) -> Self {
        Self { rule, message }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Results of a full accessibility run.
#[derive(Debug, Default)]
pub struct A11yReport {
    pub files_checked: usize,
    /// Issues keyed by root-relative path; files without issues are absent.
    pub issues: BTreeMap<String, Vec<Issue>>,
}

impl A11yReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues per rule across all files.
    pub fn counts_by_rule(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for issue in self.issues.values().flatten() {
            *counts.entry(issue.rule).or_insert(0) += 1;
        }
        counts
    }
}

/// Run every check over one document.
pub fn check_content(content: &str, cfg: &A11yConfig) -> Vec<Issue> {
    let mut issues = check_heading_hierarchy(content);
    issues.extend(check_alt_text(content));
    issues.extend(check_link_text(content, &cfg.link_phrases));
    issues
}

/// Run every check over one file. An unreadable file is logged and yields
/// no issues.
pub fn check_file(path: &Path, cfg: &A11yConfig) -> Vec<Issue> {
    match std::fs::read_to_string(path) {
        Ok(content) => check_content(&content, cfg),
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not read file: {e}");
            Vec::new()
        }
    }
}

/// Check every markdown file below `root`.
pub fn run(root: &Path, cfg: &A11yConfig) -> A11yReport {
    let mut report = A11yReport::default();

    for path in markdown::discover_markdown(root, &cfg.skip_dirs) {
        let rel = markdown::relative_display(root, &path);
        tracing::debug!("checking {rel}");
        report.files_checked += 1;

        let issues = check_file(&path, cfg);
        if !issues.is_empty() {
            report.issues.insert(rel, issues);
        }
    }

    report
}

/// Render the markdown report file.
pub fn render_report(report: &A11yReport) -> String {
    let mut out = String::from("# Accessibility Check Report\n\n");
    if report.is_clean() {
        out.push_str("✅ No accessibility issues found!\n");
        return out;
    }
    for (file, issues) in &report.issues {
        out.push_str(&format!("## {file}\n\n"));
        for issue in issues {
            out.push_str(&format!("- ❌ {issue}\n"));
        }
        out.push('\n');
    }
    out
}

pub fn write_report(report: &A11yReport, path: &Path) -> Result<()> {
    std::fs::write(path, render_report(report))
        .with_context(|| format!("failed to write report {}", path.display()))
}

/// Print the console summary.
pub fn print_summary(report: &A11yReport, verbose: bool) {
    println!("\n📊 Accessibility Check Complete");
    println!("Files checked: {}", report.files_checked);

    if report.is_clean() {
        println!("✅ No accessibility issues found!");
        return;
    }

    println!("Issues found in {} files:", report.issues.len());
    for (file, issues) in &report.issues {
        println!("  ❌ {file}: {} issues", issues.len());
        if verbose {
            for issue in issues {
                println!("     - [{}] {issue}", issue.rule);
            }
        }
    }
    let by_rule: Vec<String> = report
        .counts_by_rule()
        .iter()
        .map(|(rule, n)| format!("{rule}: {n}"))
        .collect();
    println!("By rule: {}", by_rule.join(", "));
}
