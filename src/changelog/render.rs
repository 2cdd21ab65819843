use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::git::Commit;

/// Lines of the standard changelog header kept on a full rebuild.
pub const HEADER_LINES: usize = 6;

pub const OTHER_CHANGES: &str = "🔄 Other Changes";
const CONTRIBUTORS: &str = "### 👥 Contributors";

/// Conventional commit types in display order.
const COMMIT_TYPES: [(&str, &str); 11] = [
    ("feat", "✨ Features"),
    ("fix", "🐛 Bug Fixes"),
    ("docs", "📚 Documentation"),
    ("style", "🎨 Styling"),
    ("refactor", "♻️ Refactoring"),
    ("perf", "⚡ Performance"),
    ("test", "🧪 Tests"),
    ("build", "🏗️ Build System"),
    ("ci", "👷 CI/CD"),
    ("chore", "🔧 Maintenance"),
    ("revert", "⏪ Reverts"),
];

static CONVENTIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(\(([^)]+)\))?: (.+)").expect("valid regex"));

/// A merged pull request, reduced to what the changelog shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPull {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub url: String,
}

/// `type(scope): description`, split up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventional<'a> {
    pub kind: Option<&'a str>,
    pub scope: Option<&'a str>,
    pub description: &'a str,
}

pub fn parse_conventional(message: &str) -> Conventional<'_> {
    match CONVENTIONAL.captures(message) {
        Some(caps) => Conventional {
            kind: caps.get(1).map(|m| m.as_str()),
            scope: caps.get(3).map(|m| m.as_str()),
            description: caps.get(4).map_or(message, |m| m.as_str()),
        },
        None => Conventional {
            kind: None,
            scope: None,
            description: message,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Commit {
        short_sha: String,
        description: String,
        author: String,
    },
    PullRequest {
        number: u64,
        title: String,
        author: String,
        url: String,
    },
}

impl Change {
    fn line(&self) -> String {
        match self {
            Change::Commit {
                short_sha,
                description,
                author,
            } => format!("- {description} ({short_sha} by {author})"),
            Change::PullRequest {
                number,
                title,
                author,
                url,
            } => format!("- {title} ([#{number}]({url}) by @{author})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: &'static str,
    pub changes: Vec<Change>,
}

/// Position and label of a commit type; unknown types sort last.
fn slot(kind: Option<&str>) -> (usize, &'static str) {
    kind.and_then(|k| COMMIT_TYPES.iter().position(|(t, _)| *t == k))
        .map_or((COMMIT_TYPES.len(), OTHER_CHANGES), |i| (i, COMMIT_TYPES[i].1))
}

/// Group commits then pull requests by conventional type, in display order.
pub fn categorize(commits: &[Commit], pulls: &[MergedPull]) -> Vec<Category> {
    let mut slots: BTreeMap<usize, Category> = BTreeMap::new();
    let mut push = |kind: Option<&str>, change: Change| {
        let (order, label) = slot(kind);
        slots
            .entry(order)
            .or_insert_with(|| Category {
                label,
                changes: Vec::new(),
            })
            .changes
            .push(change);
    };

    for commit in commits {
        let parsed = parse_conventional(&commit.message);
        push(
            parsed.kind,
            Change::Commit {
                short_sha: commit.sha.chars().take(7).collect(),
                description: parsed.description.to_string(),
                author: commit.author.clone(),
            },
        );
    }
    for pr in pulls {
        push(
            parse_conventional(&pr.title).kind,
            Change::PullRequest {
                number: pr.number,
                title: pr.title.clone(),
                author: pr.author.clone(),
                url: pr.url.clone(),
            },
        );
    }

    slots.into_values().collect()
}

/// `## [version] - date` followed by one `###` list per category.
pub fn render_version_section(version: &str, date: &str, categories: &[Category]) -> String {
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut lines = vec![format!("## [{version}] - {date}"), String::new()];

    for category in categories.iter().filter(|c| !c.changes.is_empty()) {
        lines.push(format!("### {}", category.label));
        lines.push(String::new());
        lines.extend(category.changes.iter().map(Change::line));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Sorted contributor list, or an empty string when nobody contributed.
pub fn render_contributors(commits: &[Commit], pulls: &[MergedPull]) -> String {
    let names: BTreeSet<&str> = commits
        .iter()
        .map(|c| c.author.as_str())
        .chain(pulls.iter().map(|p| p.author.as_str()))
        .collect();
    if names.is_empty() {
        return String::new();
    }

    let mut lines = vec![CONTRIBUTORS.to_string(), String::new()];
    lines.extend(names.iter().map(|n| format!("- @{n}")));
    lines.push(String::new());
    lines.join("\n")
}

/// Put a new version section into an existing changelog.
///
/// The section goes before the first released version (`## [`), or after
/// the header when there is none. A full rebuild keeps only the header.
pub fn merge_into(existing: &str, section: &str, contributors: &str, full_rebuild: bool) -> String {
    let lines: Vec<&str> = existing.split('\n').collect();
    let mut block = vec!["", section];
    if !contributors.is_empty() {
        block.push(contributors);
    }

    let merged: Vec<&str> = if full_rebuild {
        lines.iter().take(HEADER_LINES).copied().chain(block).collect()
    } else {
        let at = lines
            .iter()
            .position(|l| l.starts_with("## ["))
            .unwrap_or(HEADER_LINES)
            .min(lines.len());
        lines[..at]
            .iter()
            .copied()
            .chain(block)
            .chain(lines[at..].iter().copied())
            .collect()
    };

    format!("{}\n", merged.join("\n").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, message: &str, author: &str) -> Commit {
        Commit {
            sha: sha.into(),
            message: message.into(),
            author: author.into(),
            date: "2024-05-01".into(),
        }
    }

    fn pull(number: u64, title: &str, author: &str) -> MergedPull {
        MergedPull {
            number,
            title: title.into(),
            author: author.into(),
            url: format!("https://github.com/acme/docs/pull/{number}"),
        }
    }

    const HEADER: &str = "# Changelog\n\nAll notable changes.\n\nThe format is Keep a Changelog,\nand SemVer.\n";

    #[test]
    fn parses_conventional_messages() {
        let c = parse_conventional("feat(toc): add generator");
        assert_eq!(c.kind, Some("feat"));
        assert_eq!(c.scope, Some("toc"));
        assert_eq!(c.description, "add generator");

        let c = parse_conventional("fix: typo");
        assert_eq!((c.kind, c.scope, c.description), (Some("fix"), None, "typo"));

        let c = parse_conventional("Update README");
        assert_eq!(c.kind, None);
        assert_eq!(c.description, "Update README");
    }

    #[test]
    fn categories_follow_type_order() {
        let commits = vec![
            commit("1111111aaa", "chore: bump", "bob"),
            commit("2222222bbb", "Merge branch main", "amy"),
            commit("3333333ccc", "feat: toc", "amy"),
            commit("4444444ddd", "wip(x): unknown type", "amy"),
        ];
        let pulls = vec![pull(7, "fix: broken links", "carol")];
        let labels: Vec<&str> = categorize(&commits, &pulls).iter().map(|c| c.label).collect();
        assert_eq!(
            labels,
            vec!["✨ Features", "🐛 Bug Fixes", "🔧 Maintenance", OTHER_CHANGES]
        );
    }

    #[test]
    fn renders_section_lines() {
        let commits = vec![commit("abcdef123456", "feat(toc): add generator", "amy")];
        let pulls = vec![pull(12, "feat: badges", "carol")];
        let section = render_version_section("v1.2.0", "2024-05-03", &categorize(&commits, &pulls));
        assert_eq!(
            section,
            "## [1.2.0] - 2024-05-03\n\n### ✨ Features\n\n\
             - add generator (abcdef1 by amy)\n\
             - feat: badges ([#12](https://github.com/acme/docs/pull/12) by @carol)\n"
        );
    }

    #[test]
    fn contributors_are_sorted_and_unique() {
        let commits = vec![commit("a", "x", "zed"), commit("b", "y", "amy")];
        let pulls = vec![pull(1, "z", "amy")];
        assert_eq!(
            render_contributors(&commits, &pulls),
            "### 👥 Contributors\n\n- @amy\n- @zed\n"
        );
        assert_eq!(render_contributors(&[], &[]), "");
    }

    #[test]
    fn merge_inserts_before_latest_release() {
        let existing = format!("{HEADER}\n## [0.1.0] - 2024-01-01\n\n- first\n");
        let merged = merge_into(&existing, "## [0.2.0] - 2024-05-01\n\n- new\n", "", false);
        let new_at = merged.find("## [0.2.0]").unwrap();
        let old_at = merged.find("## [0.1.0]").unwrap();
        assert!(merged.starts_with("# Changelog\n"));
        assert!(new_at < old_at);
        assert!(merged.ends_with("- first\n"));
    }

    #[test]
    fn merge_without_releases_goes_after_header() {
        let merged = merge_into(HEADER, "## [0.1.0] - d\n", "### 👥 Contributors\n\n- @amy\n", false);
        assert_eq!(
            merged,
            "# Changelog\n\nAll notable changes.\n\nThe format is Keep a Changelog,\nand SemVer.\n\n\
             ## [0.1.0] - d\n\n### 👥 Contributors\n\n- @amy\n"
        );
    }

    #[test]
    fn full_rebuild_keeps_only_header() {
        let existing = format!("{HEADER}\n## [0.1.0] - 2024-01-01\n\n- first\n");
        let merged = merge_into(&existing, "## [1.0.0] - d\n", "", true);
        assert!(merged.contains("## [1.0.0] - d"));
        assert!(!merged.contains("0.1.0"));
        assert!(merged.starts_with("# Changelog\n\nAll notable changes."));
    }
}
