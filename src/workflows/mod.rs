//! GitHub Actions workflow file validation.

use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::markdown;

/// Validation result for one workflow file.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub valid: bool,
}

impl FileReport {
    pub fn passes(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// Errors and warnings for one workflow document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Findings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate the text of a workflow file.
pub fn validate_source(text: &str) -> Findings {
    let mut findings = Findings::default();

    let doc: Value = match serde_yaml::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            findings.errors.push(format!("YAML parsing error: {e}"));
            if let Some(loc) = e.location() {
                findings
                    .errors
                    .push(format!("  at line {}, column {}", loc.line(), loc.column()));
            }
            return findings;
        }
    };

    let root = match doc {
        Value::Null => {
            findings
                .errors
                .push("Empty or invalid YAML structure".to_string());
            return findings;
        }
        Value::Mapping(m) => m,
        _ => {
            findings
                .errors
                .push("Top-level YAML value must be a mapping".to_string());
            return findings;
        }
    };

    check_top_level(&root, &mut findings);
    check_lines(text, &mut findings);
    if let Some(Value::Mapping(jobs)) = root.get("jobs") {
        check_jobs(jobs, &mut findings);
    }

    findings
}

fn check_top_level(root: &Mapping, findings: &mut Findings) {
    if !root.contains_key("name") {
        findings.warnings.push("Missing 'name' field".to_string());
    }
    if !root.contains_key("on") {
        findings.errors.push("Missing 'on' trigger field".to_string());
    }
    if !root.contains_key("jobs") {
        findings.errors.push("Missing 'jobs' field".to_string());
    }
}

fn check_lines(text: &str, findings: &mut Findings) {
    for (i, line) in text.lines().enumerate() {
        let n = i + 1;
        if line.contains("body: `") {
            findings.warnings.push(format!(
                "Line {n}: Template literal in body field - consider using array.join() format"
            ));
        }
        if line.trim_start().starts_with("if:") && line.contains("github.") && !line.contains("${{")
        {
            findings.warnings.push(format!(
                "Line {n}: Unescaped conditional - wrap with ${{{{ }}}} for safety"
            ));
        }
    }
}

fn check_jobs(jobs: &Mapping, findings: &mut Findings) {
    for (name, job) in jobs {
        let name = match name {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        };
        match job {
            Value::Mapping(job) => {
                // Reusable-workflow calls run on the callee's runners.
                if !job.contains_key("runs-on") && !job.contains_key("uses") {
                    findings
                        .errors
                        .push(format!("Job '{name}' missing 'runs-on' field"));
                }
            }
            _ => findings
                .errors
                .push(format!("Job '{name}' has invalid configuration")),
        }
    }
}

/// Validate every `*.yml` / `*.yaml` file directly inside `dir`, sorted.
///
/// File names are shown relative to `root`.
pub fn validate_dir(root: &Path, dir: &Path) -> Result<Vec<FileReport>> {
    if !dir.is_dir() {
        bail!("Workflow directory '{}' does not exist", dir.display());
    }

    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_workflow_file(p))
        .collect();
    files.sort();

    let reports = files
        .iter()
        .map(|path| {
            let findings = match std::fs::read_to_string(path) {
                Ok(text) => validate_source(&text),
                Err(e) => Findings {
                    errors: vec![format!("Unexpected error: {e}")],
                    warnings: Vec::new(),
                },
            };
            FileReport {
                file: markdown::relative_display(root, path),
                valid: findings.errors.is_empty(),
                errors: findings.errors,
                warnings: findings.warnings,
            }
        })
        .collect();

    Ok(reports)
}

fn is_workflow_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml" | "yaml")
    )
}

/// True when every report passes.
pub fn all_pass(reports: &[FileReport], strict: bool) -> bool {
    reports.iter().all(|r| r.passes(strict))
}

/// Print per-file results and the summary table.
pub fn print_text(reports: &[FileReport], strict: bool) {
    if reports.is_empty() {
        println!("⚠️  No workflow files found");
        return;
    }
    println!("🔍 Validating {} workflow files...\n", reports.len());

    for report in reports {
        if !report.errors.is_empty() {
            println!("❌ {}", report.file);
            for error in &report.errors {
                println!("   ERROR: {error}");
            }
        } else if !report.warnings.is_empty() {
            println!("⚠️  {}", report.file);
            for warning in &report.warnings {
                println!("   WARNING: {warning}");
            }
        } else {
            println!("✅ {}", report.file);
        }
    }

    let errors: usize = reports.iter().map(|r| r.errors.len()).sum();
    let warnings: usize = reports.iter().map(|r| r.warnings.len()).sum();
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.passes(strict))
        .map(|r| r.file.as_str())
        .collect();

    println!("\n{}", "=".repeat(50));
    println!("📊 Validation Summary:");
    println!("   Files checked: {}", reports.len());
    println!("   Errors: {errors}");
    println!("   Warnings: {warnings}");
    println!("   Failed files: {}", failed.len());

    if failed.is_empty() {
        println!("\n✅ All workflow files are valid!");
    } else {
        println!("\n❌ Validation FAILED for:");
        for file in failed {
            println!("   - {file}");
        }
    }
}
