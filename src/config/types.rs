use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level `.docmaint.yaml` contents. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `owner/name` slug used for GitHub API calls and badge URLs.
    pub repository: Option<String>,
    pub github: GithubConfig,
    pub a11y: A11yConfig,
    pub versions: VersionsConfig,
    pub metrics: MetricsConfig,
    pub readme: ReadmeConfig,
    pub fix: FixConfig,
    pub changelog: ChangelogConfig,
    pub toc: TocConfig,
    pub workflows: WorkflowsConfig,
}

impl Config {
    /// Resolve the repository slug: config value first, then `GITHUB_REPOSITORY`.
    pub fn repository(&self) -> Option<String> {
        self.repository
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                std::env::var("GITHUB_REPOSITORY")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
            })
    }

    /// Display name: the repository part of the slug, else the root
    /// directory name, else `Project`.
    pub fn project_name(&self, root: &Path) -> String {
        self.repository()
            .and_then(|r| r.rsplit('/').next().map(str::to_string))
            .filter(|n| !n.is_empty())
            .or_else(|| {
                root.canonicalize()
                    .ok()?
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Project".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    pub web_url: String,
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            web_url: "https://github.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct A11yConfig {
    pub skip_dirs: Vec<String>,
    pub link_phrases: Vec<String>,
}

impl Default for A11yConfig {
    fn default() -> Self {
        Self {
            skip_dirs: ["node_modules", ".git", ".github", "venv", "__pycache__", "target"]
                .map(String::from)
                .to_vec(),
            link_phrases: ["click here", "here", "read more", "more", "link", "this"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    pub skip_dirs: Vec<String>,
    pub results_file: String,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            skip_dirs: [".git", "node_modules", "target", "venv", "__pycache__"]
                .map(String::from)
                .to_vec(),
            results_file: ".version-check-results.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub workflows: Vec<String>,
    pub period_days: i64,
    pub output: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            workflows: [
                "link-validation.yml",
                "markdown-lint.yml",
                "spell-check.yml",
                "accessibility-check.yml",
                "proposal-lifecycle.yml",
                "discussion-notifications.yml",
            ]
            .map(String::from)
            .to_vec(),
            period_days: 30,
            output: "workflow-metrics.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadmeConfig {
    pub template: String,
    pub output: String,
    pub proposals_dir: String,
    /// Workflow files that never get a status badge.
    pub skip_badges: Vec<String>,
    pub description: Option<String>,
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            template: ".github/readme-template.md".to_string(),
            output: "README.md".to_string(),
            proposals_dir: "proposals".to_string(),
            skip_badges: ["readme-compilation.yml", "metrics-collection.yml"]
                .map(String::from)
                .to_vec(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    pub max_line_length: usize,
    /// Files to fix when none are given on the command line.
    pub files: Vec<String>,
    pub skip_dirs: Vec<String>,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            max_line_length: 120,
            files: Vec::new(),
            skip_dirs: ["node_modules", ".git", "target", "venv"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    pub path: String,
    /// Extra `git log` arguments, split shell-style (e.g. `--no-merges`).
    pub git_log_args: Option<String>,
    /// Name used in the header of a new changelog. Defaults to the
    /// project name.
    pub project_name: Option<String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: "CHANGELOG.md".to_string(),
            git_log_args: None,
            project_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    pub min_depth: usize,
    pub max_depth: usize,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            min_depth: 1,
            max_depth: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowsConfig {
    pub dir: String,
    pub strict: bool,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            dir: ".github/workflows".to_string(),
            strict: false,
        }
    }
}
