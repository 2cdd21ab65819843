//! Changelog generation from git history and merged pull requests.
mod git;
mod render;

pub use git::{Commit, git_commits, parse_log, tag_date};
pub use render::{
    Category, Change, Conventional, MergedPull, OTHER_CHANGES, categorize, merge_into,
    parse_conventional, render_contributors, render_version_section,
};

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::Config;
use crate::github::{self, GithubError, PullRequest};
use crate::templates;

/// Where pull requests come from.
pub trait PullSource {
    fn closed_pulls(&self, repo: &str) -> Result<Vec<PullRequest>, GithubError>;
}

impl PullSource for github::Client {
    fn closed_pulls(&self, repo: &str) -> Result<Vec<PullRequest>, GithubError> {
        github::Client::closed_pulls(self, repo)
    }
}

#[derive(Debug, Clone)]
pub struct ChangelogOptions {
    pub version: String,
    pub since_tag: Option<String>,
    /// Release date, `YYYY-MM-DD`.
    pub date: String,
    pub full_rebuild: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogOutcome {
    Updated { commits: usize, pulls: usize },
    UpToDate,
}

/// Whether an environment switch such as `FULL_REBUILD` is on. Only
/// `true` (any case) enables it; unset, empty and other values do not.
pub fn switch_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Merged pull requests, optionally only those merged on or after `since`.
pub fn merged_since(pulls: Vec<PullRequest>, since: Option<NaiveDate>) -> Vec<MergedPull> {
    pulls
        .into_iter()
        .filter_map(|pr| {
            let merged_on = pr.merged_at?.date_naive();
            if since.is_some_and(|since| merged_on < since) {
                return None;
            }
            Some(MergedPull {
                number: pr.number,
                title: pr.title,
                author: pr.user.login,
                url: pr.html_url,
            })
        })
        .collect()
}

/// The default changelog header for a new file.
pub fn default_header(project_name: &str) -> Result<String> {
    let header = templates::builtin(templates::CHANGELOG_HEADER)?;
    Ok(templates::fill(
        header,
        &[("project_name", project_name.to_string())],
    ))
}

/// Collect history and update the changelog under `root`.
///
/// `pulls` is the pull request source and repository slug; without one
/// the changelog is built from commits only.
pub fn run(
    root: &Path,
    cfg: &Config,
    opts: &ChangelogOptions,
    pulls: Option<(&dyn PullSource, &str)>,
) -> Result<ChangelogOutcome> {
    println!("📝 Generating changelog for version {}", opts.version);
    println!(
        "   Since: {}",
        opts.since_tag.as_deref().unwrap_or("beginning")
    );
    println!("   Date: {}", opts.date);

    let extra_args = match &cfg.changelog.git_log_args {
        Some(raw) => shell_words::split(raw)
            .with_context(|| format!("invalid changelog.git_log_args: {raw}"))?,
        None => Vec::new(),
    };
    let since_tag = opts.since_tag.as_deref().filter(|_| !opts.full_rebuild);

    let commits = git_commits(root, since_tag, &extra_args).unwrap_or_else(|e| {
        tracing::warn!("could not get git commits: {e:#}");
        Vec::new()
    });

    let since_date = since_tag.and_then(|tag| match tag_date(root, tag) {
        Ok(date) => date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        Err(e) => {
            tracing::warn!("could not resolve date of {tag}: {e:#}");
            None
        }
    });

    let prs = match pulls {
        Some((source, repo)) => match source.closed_pulls(repo) {
            Ok(list) => merged_since(list, since_date),
            Err(e) => {
                tracing::warn!("could not fetch pull requests: {e}");
                Vec::new()
            }
        },
        None => {
            tracing::warn!("no GitHub token or repository, skipping pull request information");
            Vec::new()
        }
    };

    write(root, cfg, opts, &commits, &prs)
}

/// Render the collected changes into the changelog file.
pub fn write(
    root: &Path,
    cfg: &Config,
    opts: &ChangelogOptions,
    commits: &[Commit],
    prs: &[MergedPull],
) -> Result<ChangelogOutcome> {
    if commits.is_empty() && prs.is_empty() {
        println!("ℹ️  No changes found to add to changelog");
        return Ok(ChangelogOutcome::UpToDate);
    }
    println!("   Found {} commits and {} PRs", commits.len(), prs.len());

    let section = render_version_section(&opts.version, &opts.date, &categorize(commits, prs));
    let contributors = render_contributors(commits, prs);

    let path = root.join(&cfg.changelog.path);
    let existing = if path.is_file() {
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        let name = cfg
            .changelog
            .project_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| cfg.project_name(root));
        default_header(&name)?
    };

    let updated = merge_into(&existing, &section, &contributors, opts.full_rebuild);
    std::fs::write(&path, updated).with_context(|| format!("failed to write {}", path.display()))?;

    println!("✅ Changelog updated successfully");
    Ok(ChangelogOutcome::Updated {
        commits: commits.len(),
        pulls: prs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pr(number: u64, merged: Option<(i32, u32, u32)>) -> PullRequest {
        PullRequest {
            number,
            title: format!("feat: change {number}"),
            user: github::User {
                login: "octo".into(),
            },
            merged_at: merged.map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
            body: None,
            html_url: format!("https://github.com/acme/docs/pull/{number}"),
        }
    }

    fn options(full_rebuild: bool) -> ChangelogOptions {
        ChangelogOptions {
            version: "v1.0.0".into(),
            since_tag: None,
            date: "2024-06-01".into(),
            full_rebuild,
        }
    }

    #[test]
    fn merged_filter_drops_unmerged_and_old() {
        let since = NaiveDate::from_ymd_opt(2024, 5, 10);
        let pulls = vec![
            pr(1, Some((2024, 5, 10))),
            pr(2, None),
            pr(3, Some((2024, 5, 9))),
            pr(4, Some((2024, 6, 1))),
        ];
        let kept: Vec<u64> = merged_since(pulls, since).iter().map(|p| p.number).collect();
        assert_eq!(kept, vec![1, 4]);
    }

    #[test]
    fn merged_filter_without_date_keeps_all_merged() {
        let kept = merged_since(vec![pr(1, Some((2020, 1, 1))), pr(2, None)], None);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].author, "octo");
    }

    #[test]
    fn default_header_names_project() {
        let header = default_header("AILIS").unwrap();
        assert!(header.contains("All notable changes to the AILIS project"));
        assert!(header.split('\n').nth(5).unwrap().starts_with("and this project"));
    }

    #[test]
    fn write_creates_changelog_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let commits = vec![Commit {
            sha: "abcdef0123".into(),
            message: "docs: explain layers".into(),
            author: "amy".into(),
            date: "2024-05-30".into(),
        }];

        let cfg = Config {
            repository: Some("acme/handbook".into()),
            ..Config::default()
        };
        let outcome = write(dir.path(), &cfg, &options(false), &commits, &[]).unwrap();
        assert_eq!(outcome, ChangelogOutcome::Updated { commits: 1, pulls: 0 });

        let text = std::fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
        assert!(text.starts_with("# Changelog\n"));
        assert!(text.contains("All notable changes to the handbook project"));
        assert!(text.contains("## [1.0.0] - 2024-06-01\n\n### 📚 Documentation\n\n- explain layers (abcdef0 by amy)"));
        assert!(text.contains("### 👥 Contributors\n\n- @amy"));
    }

    #[test]
    fn nothing_to_add_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = write(dir.path(), &Config::default(), &options(false), &[], &[]).unwrap();
        assert_eq!(outcome, ChangelogOutcome::UpToDate);
        assert!(!dir.path().join("CHANGELOG.md").exists());
    }

    #[test]
    fn invalid_git_log_args_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.changelog.git_log_args = Some("--author='unterminated".into());
        assert!(run(dir.path(), &cfg, &options(false), None).is_err());
    }

    #[test]
    fn configured_header_name_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config {
            repository: Some("acme/handbook".into()),
            ..Config::default()
        };
        cfg.changelog.project_name = Some("Field Guide".into());
        let commits = vec![Commit {
            sha: "abcdef0123".into(),
            message: "fix: typo".into(),
            author: "amy".into(),
            date: "2024-05-30".into(),
        }];

        write(dir.path(), &cfg, &options(false), &commits, &[]).unwrap();
        let text = std::fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
        assert!(text.contains("All notable changes to the Field Guide project"));
        assert!(!text.contains("the this project"));
    }

    #[test]
    fn switch_accepts_only_true() {
        assert!(switch_enabled(Some("true")));
        assert!(switch_enabled(Some(" TRUE ")));
        assert!(!switch_enabled(Some("")));
        assert!(!switch_enabled(Some("false")));
        assert!(!switch_enabled(Some("1")));
        assert!(!switch_enabled(None));
    }
}
