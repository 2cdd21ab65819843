use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};
use regex::Regex;
use serde_yaml::Value;

use crate::config::ReadmeConfig;

static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("valid regex"));
static STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)status:\s*([^\n]+)").expect("valid regex"));

const DEFAULT_DESCRIPTION: &str = "\
A collection of proposals, specifications and supporting documentation.

> **Note**: Proposals here are conversation starters, not prescriptive standards.
> Community feedback is welcome.";

/// Repository statistics supplied by the CI job through `REPO_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStats {
    pub contributors: String,
    pub commits: String,
    pub proposals: String,
    pub workflows: String,
    pub last_updated: String,
}

impl ProjectStats {
    pub fn from_env(now: DateTime<Utc>) -> Self {
        let var = |name: &str, default: String| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        Self {
            contributors: var("REPO_CONTRIBUTORS", "0".into()),
            commits: var("REPO_COMMITS", "0".into()),
            proposals: var("REPO_PROPOSALS", "0".into()),
            workflows: var("REPO_WORKFLOWS", "0".into()),
            last_updated: var("LAST_UPDATED", now.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }

    /// One-line status shown under the badges.
    pub fn headline(&self) -> String {
        format!(
            "**Active Proposals**: {} | **Contributors**: {} | **Workflows**: {}",
            self.proposals, self.contributors, self.workflows
        )
    }
}

/// Status badges for every workflow in `.github/workflows` except the
/// configured utility ones. Empty when the repository slug is unknown.
pub fn workflow_badges(root: &Path, repo: Option<&str>, web_url: &str, cfg: &ReadmeConfig) -> String {
    let Some(repo) = repo else {
        tracing::warn!("repository not configured, skipping workflow badges");
        return String::new();
    };
    let dir = root.join(".github/workflows");
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return String::new();
    };

    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "yml"))
        .collect();
    files.sort();

    let base = web_url.trim_end_matches('/');
    files
        .iter()
        .filter_map(|path| {
            let file = path.file_name()?.to_string_lossy().into_owned();
            if cfg.skip_badges.contains(&file) {
                return None;
            }
            let name = workflow_name(path)?;
            let action_url = format!("{base}/{repo}/actions/workflows/{file}");
            Some(format!("[![{name}]({action_url}/badge.svg)]({action_url})"))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The workflow's `name`, falling back to the file stem. `None` when the
/// file cannot be read or parsed.
fn workflow_name(path: &Path) -> Option<String> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_yaml::from_str::<Value>(&text).map_err(|e| e.to_string()));
    let doc = match parsed {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("could not parse workflow {}: {e}", path.display());
            return None;
        }
    };
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    Some(
        doc.get("name")
            .and_then(Value::as_str)
            .map_or(stem, str::to_string),
    )
}

struct Proposal {
    file: String,
    title: String,
    status: String,
    modified: SystemTime,
}

/// Markdown table of the proposals directory, newest first.
pub fn proposal_listing(root: &Path, proposals_dir: &str) -> String {
    let dir = root.join(proposals_dir);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return "_No proposals directory found._".to_string();
    };

    let mut proposals: Vec<Proposal> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .filter(|p| p.file_name().is_some_and(|n| n != "README.md"))
        .filter_map(|path| match read_proposal(&path) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("could not process proposal {}: {e}", path.display());
                None
            }
        })
        .collect();

    if proposals.is_empty() {
        return "_No proposal files found._".to_string();
    }
    proposals.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.file.cmp(&b.file)));

    let mut table = vec![
        "| Proposal | Status | Last Updated |".to_string(),
        "|----------|--------|--------------|".to_string(),
    ];
    for p in proposals {
        let modified = DateTime::<Local>::from(p.modified).format("%Y-%m-%d");
        table.push(format!(
            "| [{}]({proposals_dir}/{}) | {} | {modified} |",
            p.title, p.file, p.status
        ));
    }
    table.join("\n")
}

fn read_proposal(path: &Path) -> std::io::Result<Proposal> {
    let content = std::fs::read_to_string(path)?;
    let modified = std::fs::metadata(path)?.modified()?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Proposal {
        title: TITLE
            .captures(&content)
            .map_or(stem, |c| c[1].trim().to_string()),
        status: STATUS
            .captures(&content)
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Draft".to_string()),
        file,
        modified,
    })
}

pub fn contributing_info(root: &Path, project_name: &str) -> String {
    if root.join("CONTRIBUTING.md").is_file() {
        format!(
            "See our [Contributing Guidelines](CONTRIBUTING.md) for details on how to participate in the {project_name} project.\n\n\
             We follow an RFC-style process for proposals with a minimum 4-week review period."
        )
    } else {
        "Contributions are welcome! Please open an issue to discuss your ideas before submitting a pull request."
            .to_string()
    }
}

/// Links to the documentation files that exist.
pub fn documentation_links(root: &Path) -> String {
    const DOCS: [(&str, &str); 5] = [
        ("CONTRIBUTING.md", "Contributing Guidelines"),
        ("FEEDBACK.md", "Feedback Areas"),
        ("CHANGELOG.md", "Changelog"),
        ("docs/", "Additional Documentation"),
        ("docs/session-notes/", "Development Session Notes"),
    ];

    let links: Vec<String> = DOCS
        .iter()
        .filter(|(path, _)| root.join(path).exists())
        .map(|(path, label)| format!("- [{label}]({path})"))
        .collect();

    if links.is_empty() {
        "_Documentation is being developed._".to_string()
    } else {
        links.join("\n")
    }
}

pub fn project_description(cfg: &ReadmeConfig) -> String {
    cfg.description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string()
}

pub fn footer(stats: &ProjectStats) -> String {
    format!(
        "*This README is automatically updated. Last generated: {}*\n\n\
         **Repository Statistics**: {} contributors • {} commits • {} proposals • {} workflows",
        stats.last_updated, stats.contributors, stats.commits, stats.proposals, stats.workflows
    )
}
