//! Version consistency audit across manifests, version files, the
//! changelog and version references in markdown.
mod extract;

pub use extract::{
    from_cargo_toml, from_changelog, from_package_json, from_pyproject, from_text_file,
    references_in_markdown,
};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::VersionsConfig;
use crate::markdown;
use crate::output;

/// Severity of an audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("ERROR"),
            Self::Warning => f.write_str("WARNING"),
            Self::Info => f.write_str("INFO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Whether a file defines the version or merely mentions one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Primary,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSource {
    /// The version (the first one, for references with several).
    pub version: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_versions: Option<Vec<String>>,
}

impl VersionSource {
    fn primary(version: String) -> Self {
        Self {
            version,
            kind: SourceKind::Primary,
            consistent: true,
            all_versions: None,
        }
    }

    fn reference(mut versions: Vec<String>) -> Option<Self> {
        if versions.is_empty() {
            return None;
        }
        let all_versions = (versions.len() > 1).then(|| versions.clone());
        Some(Self {
            version: versions.swap_remove(0),
            kind: SourceKind::Reference,
            consistent: true,
            all_versions,
        })
    }

    /// Every version this source mentions.
    pub fn versions(&self) -> Vec<&str> {
        match &self.all_versions {
            Some(all) => all.iter().map(String::as_str).collect(),
            None => vec![self.version.as_str()],
        }
    }
}

/// Outcome of a scan + analysis.
#[derive(Debug, Default, Serialize)]
pub struct VersionAudit {
    pub consistent: bool,
    pub primary_version: Option<String>,
    pub versions: BTreeMap<String, VersionSource>,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
    pub summary: Summary,
}

#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub primary_files: usize,
    pub reference_files: usize,
}

const MANIFESTS: [&str; 3] = ["package.json", "pyproject.toml", "Cargo.toml"];
const ROOT_VERSION_FILES: [&str; 2] = ["VERSION", "version.txt"];
const CHANGELOG: &str = "CHANGELOG.md";
const README: &str = "README.md";

/// Collect version sources below `root`. Unparseable files become warnings.
pub fn scan(root: &Path, cfg: &VersionsConfig) -> VersionAudit {
    let mut audit = VersionAudit::default();

    let manifests = markdown::discover_files(root, &cfg.skip_dirs, |p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| MANIFESTS.contains(&n))
    });

    for path in manifests {
        let rel = markdown::relative_display(root, &path);
        tracing::info!("checking {rel}");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let extracted = std::fs::read_to_string(&path)
            .with_context(|| format!("could not read {rel}"))
            .and_then(|content| match name {
                "package.json" => from_package_json(&content),
                "pyproject.toml" => from_pyproject(&content),
                _ => from_cargo_toml(&content),
            });
        match extracted {
            Ok(Some(v)) => {
                audit.versions.insert(rel, VersionSource::primary(v));
            }
            Ok(None) => {}
            Err(e) => audit.issues.push(Issue::new(
                Severity::Warning,
                format!("Could not parse {rel}: {e:#}"),
            )),
        }
    }

    for name in ROOT_VERSION_FILES.iter().chain(std::iter::once(&CHANGELOG)) {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        tracing::info!("checking {name}");
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let version = if *name == CHANGELOG {
                    from_changelog(&content)
                } else {
                    from_text_file(&content)
                };
                if let Some(v) = version {
                    audit.versions.insert(name.to_string(), VersionSource::primary(v));
                }
            }
            Err(e) => audit.issues.push(Issue::new(
                Severity::Warning,
                format!("Could not read {name}: {e}"),
            )),
        }
    }

    for path in markdown::discover_markdown(root, &cfg.skip_dirs) {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name == CHANGELOG || name == README {
            continue;
        }
        let rel = markdown::relative_display(root, &path);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                if let Some(source) = VersionSource::reference(references_in_markdown(&content)) {
                    audit.versions.insert(rel, source);
                }
            }
            Err(e) => audit.issues.push(Issue::new(
                Severity::Warning,
                format!("Could not parse {rel}: {e}"),
            )),
        }
    }

    audit
}

/// Decide consistency, mark offending sources, and fill in recommendations
/// and the summary.
pub fn analyze(audit: &mut VersionAudit) {
    audit.consistent = check_consistency(audit);
    add_general_recommendations(audit);

    audit.primary_version = audit
        .versions
        .values()
        .find(|s| s.kind == SourceKind::Primary && s.consistent)
        .map(|s| s.version.clone());

    audit.summary = Summary {
        total_files: audit.versions.len(),
        primary_files: count_kind(audit, SourceKind::Primary),
        reference_files: count_kind(audit, SourceKind::Reference),
    };
}

fn count_kind(audit: &VersionAudit, kind: SourceKind) -> usize {
    audit.versions.values().filter(|s| s.kind == kind).count()
}

fn check_consistency(audit: &mut VersionAudit) -> bool {
    if audit.versions.is_empty() {
        audit.issues.push(Issue::new(
            Severity::Info,
            "No version files found in repository",
        ));
        return true;
    }

    tracing::info!("analyzing {} version sources", audit.versions.len());

    let unique: BTreeSet<String> = audit
        .versions
        .values()
        .filter(|s| s.kind == SourceKind::Primary)
        .map(|s| s.version.clone())
        .collect();

    if unique.is_empty() {
        audit.issues.push(Issue::new(
            Severity::Warning,
            "No primary version files found",
        ));
        return true;
    }

    if unique.len() > 1 {
        let listed: Vec<&str> = unique.iter().map(String::as_str).collect();
        tracing::warn!("inconsistent primary versions: {}", listed.join(", "));
        for source in audit.versions.values_mut() {
            if source.kind == SourceKind::Primary {
                source.consistent = false;
            }
        }
        audit.issues.push(Issue::new(
            Severity::Error,
            format!("Inconsistent primary versions: {}", listed.join(", ")),
        ));
        audit.recommendations.extend(
            [
                "Choose one canonical version across all primary version files",
                "Update all package.json, pyproject.toml, Cargo.toml files to use the same version",
                "Consider using a single VERSION file as the source of truth",
            ]
            .map(String::from),
        );
        return false;
    }

    let canonical = unique.into_iter().next().unwrap_or_default();
    tracing::info!("consistent primary version: {canonical}");

    let mut consistent = true;
    for (file, source) in audit.versions.iter_mut() {
        if source.kind != SourceKind::Reference {
            continue;
        }
        let refs = source.versions();
        if refs.contains(&canonical.as_str()) {
            continue;
        }
        let listed = refs.join(", ");
        source.consistent = false;
        consistent = false;
        audit.issues.push(Issue::new(
            Severity::Warning,
            format!("{file} references version(s) [{listed}] but primary version is {canonical}"),
        ));
    }

    consistent
}

fn add_general_recommendations(audit: &mut VersionAudit) {
    if !audit.recommendations.is_empty() {
        return;
    }
    let advice: &[&str] = match audit.versions.len() {
        0 => &[
            "Consider adding a VERSION file to track releases",
            "Add version information to package files if using package managers",
            "Include version information in CHANGELOG.md",
        ],
        1 => &[],
        _ => &[
            "Consider using automated version bumping tools",
            "Add version consistency checks to your CI/CD pipeline",
            "Document your versioning strategy in CONTRIBUTING.md",
        ],
    };
    audit
        .recommendations
        .extend(advice.iter().map(|s| s.to_string()));
}

/// Scan and analyze in one go.
pub fn audit(root: &Path, cfg: &VersionsConfig) -> VersionAudit {
    tracing::info!("scanning repository for version information");
    let mut audit = scan(root, cfg);
    analyze(&mut audit);
    audit
}

/// Write the JSON results file and publish CI step outputs.
pub fn save_results(audit: &VersionAudit, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(audit)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;

    let mut outputs = vec![("consistent", audit.consistent.to_string())];
    if let Some(v) = &audit.primary_version {
        outputs.push(("primary_version", v.clone()));
    }
    output::publish(&outputs)
}

pub fn print_summary(audit: &VersionAudit) {
    println!("\n📊 Version Check Summary:");
    println!("   Files checked: {}", audit.versions.len());
    println!("   Issues found: {}", audit.issues.len());
    println!(
        "   Consistent: {}",
        if audit.consistent { "✅" } else { "❌" }
    );

    if audit.consistent {
        println!("\n✅ Version consistency check passed!");
        return;
    }
    println!("\n❌ Version inconsistencies detected!");
    for issue in &audit.issues {
        if issue.severity == Severity::Error {
            println!("   {}: {}", issue.severity, issue.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn audit_dir(files: &[(&str, &str)]) -> VersionAudit {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        audit(dir.path(), &VersionsConfig::default())
    }

    #[test]
    fn empty_repo_is_consistent_with_info() {
        let audit = audit_dir(&[]);
        assert!(audit.consistent);
        assert_eq!(audit.issues[0].severity, Severity::Info);
        assert_eq!(audit.recommendations.len(), 3);
        assert!(audit.primary_version.is_none());
    }

    #[test]
    fn matching_primaries_and_references() {
        let audit = audit_dir(&[
            ("VERSION", "v1.2.0\n"),
            ("web/package.json", r#"{"version": "1.2.0"}"#),
            ("CHANGELOG.md", "# Changelog\n\n## [1.2.0] - 2024-06-01\n"),
            ("docs/guide.md", "Install v1.2.0 or read about [1.1.0].\n"),
            ("README.md", "Version 9.9.9\n"),
        ]);
        assert!(audit.consistent, "{:?}", audit.issues);
        assert_eq!(audit.primary_version.as_deref(), Some("1.2.0"));
        assert_eq!(audit.summary.primary_files, 3);
        assert_eq!(audit.summary.reference_files, 1);
        assert!(!audit.versions.contains_key("README.md"));
    }

    #[test]
    fn stale_reference_is_flagged() {
        let audit = audit_dir(&[
            ("VERSION", "2.0.0"),
            ("docs/old.md", "Works with Version 1.0.0 only.\n"),
        ]);
        assert!(!audit.consistent);
        assert!(!audit.versions["docs/old.md"].consistent);
        assert!(audit.versions["VERSION"].consistent);
        assert_eq!(audit.primary_version.as_deref(), Some("2.0.0"));
        assert!(
            audit.issues[0]
                .message
                .contains("docs/old.md references version(s) [1.0.0] but primary version is 2.0.0")
        );
    }

    #[test]
    fn conflicting_primaries_fail() {
        let audit = audit_dir(&[
            ("VERSION", "1.0.0"),
            ("Cargo.toml", "[package]\nname = \"x\"\nversion = \"1.1.0\"\n"),
        ]);
        assert!(!audit.consistent);
        assert!(audit.primary_version.is_none());
        let error = audit
            .issues
            .iter()
            .find(|i| i.severity == Severity::Error)
            .unwrap();
        assert_eq!(error.message, "Inconsistent primary versions: 1.0.0, 1.1.0");
        assert_eq!(
            audit.recommendations[0],
            "Choose one canonical version across all primary version files"
        );
    }

    #[test]
    fn unparseable_manifest_is_a_warning() {
        let audit = audit_dir(&[("package.json", "{broken"), ("VERSION", "0.1.0")]);
        assert!(audit.consistent);
        assert!(
            audit
                .issues
                .iter()
                .any(|i| i.severity == Severity::Warning
                    && i.message.starts_with("Could not parse package.json"))
        );
    }

    #[test]
    fn references_only_warn_about_missing_primary() {
        let audit = audit_dir(&[("docs/a.md", "see v3.0.0\n")]);
        assert!(audit.consistent);
        assert_eq!(audit.issues[0].message, "No primary version files found");
    }

    #[test]
    fn results_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("VERSION"), "1.0.0").unwrap();
        let audit = audit(dir.path(), &VersionsConfig::default());

        let out = dir.path().join("results.json");
        save_results(&audit, &out).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["consistent"], true);
        assert_eq!(json["primary_version"], "1.0.0");
        assert_eq!(json["versions"]["VERSION"]["type"], "primary");
        assert_eq!(json["summary"]["total_files"], 1);
    }
}
