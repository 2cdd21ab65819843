//! End-to-end runs of the maintenance jobs against a throwaway repository.

use std::fs;
use std::path::Path;

use docmaint::changelog::{self, ChangelogOptions, Commit};
use docmaint::config::{self, Config};
use docmaint::fix::{self, FileStatus, FixOptions};
use docmaint::toc::{self, TocOutcome};
use docmaint::{a11y, readme, versions, workflows};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A small documentation repository with a few deliberate problems.
fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        ".docmaint.yaml",
        "repository: acme/handbook\nfix:\n  max_line_length: 80\n",
    );
    write(root, "VERSION", "1.4.0\n");
    write(root, "package.json", r#"{"name": "handbook", "version": "1.4.0"}"#);
    write(
        root,
        "docs/guide.md",
        "# Guide\nIntro with *emphasis*.\n#### Deep\n![](diagram.png)\nSee [here](x.md) for v1.4.0.\n```\nplain\n```",
    );
    write(
        root,
        "proposals/layers.md",
        "# Layer Model\n\nstatus: Accepted\n",
    );
    write(
        root,
        ".github/workflows/lint.yml",
        "name: Lint\non: push\njobs:\n  lint:\n    runs-on: ubuntu-latest\n",
    );
    write(root, ".github/workflows/broken.yaml", "on: push\n");
    dir
}

#[test]
fn accessibility_then_fix_then_toc() {
    let dir = fixture();
    let root = dir.path();
    let cfg = config::load(root, None).unwrap();
    assert_eq!(cfg.fix.max_line_length, 80);

    let report = a11y::run(root, &cfg.a11y);
    let issues = &report.issues["docs/guide.md"];
    assert_eq!(issues.len(), 3);
    assert!(a11y::render_report(&report).contains("## docs/guide.md"));

    let guide = root.join("docs/guide.md");
    let outcome = fix::fix_file(&guide, &FixOptions::from(&cfg.fix), false).unwrap();
    assert_eq!(outcome.status, FileStatus::Fixed);
    let fixed = fs::read_to_string(&guide).unwrap();
    assert!(fixed.starts_with("# Guide\n\nIntro with _emphasis_.\n\n#### Deep\n\n"));
    assert!(fixed.contains("```text\nplain\n```\n"));
    assert!(fixed.ends_with("```\n") && !fixed.ends_with("\n\n"));

    let again = fix::fix_file(&guide, &FixOptions::from(&cfg.fix), false).unwrap();
    assert_eq!(again.status, FileStatus::Unchanged);

    assert_eq!(
        toc::process_file(&guide, 1, 6).unwrap(),
        TocOutcome::Updated { entries: 2 }
    );
    let with_toc = fs::read_to_string(&guide).unwrap();
    assert!(with_toc.contains("<!-- TOC_START -->"));
    assert!(with_toc.contains("- [Guide](#guide)\n      - [Deep](#deep)"));
    assert_eq!(
        toc::process_file(&guide, 1, 6).unwrap(),
        TocOutcome::AlreadyCurrent
    );
}

#[test]
fn versions_agree_across_manifests_and_docs() {
    let dir = fixture();
    let audit = versions::audit(dir.path(), &Config::default().versions);
    assert!(audit.consistent, "{:?}", audit.issues);
    assert_eq!(audit.primary_version.as_deref(), Some("1.4.0"));
    assert_eq!(audit.summary.primary_files, 2);
    assert_eq!(audit.summary.reference_files, 1);
}

#[test]
fn version_mismatch_is_reported() {
    let dir = fixture();
    write(dir.path(), "VERSION", "2.0.0\n");
    let audit = versions::audit(dir.path(), &Config::default().versions);
    assert!(!audit.consistent);
    assert!(!audit.recommendations.is_empty());
}

#[test]
fn workflow_directory_validation() {
    let dir = fixture();
    let wf = dir.path().join(".github/workflows");
    let reports = workflows::validate_dir(dir.path(), &wf).unwrap();
    assert_eq!(reports.len(), 2);

    let broken = &reports[0];
    assert_eq!(broken.file, ".github/workflows/broken.yaml");
    assert!(!broken.valid);
    assert_eq!(broken.errors, vec!["Missing 'jobs' field"]);
    assert!(reports[1].valid);
    assert!(!workflows::all_pass(&reports, false));

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[1]["file"], ".github/workflows/lint.yml");
    assert_eq!(json[1]["valid"], true);
}

#[test]
fn readme_is_compiled_from_builtin_template() {
    let dir = fixture();
    let cfg = config::load(dir.path(), None).unwrap();
    readme::run(dir.path(), &cfg).unwrap();

    let text = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(text.starts_with("# handbook\n"));
    assert!(text.contains("[![Lint](https://github.com/acme/handbook/actions/workflows/lint.yml/badge.svg)]"));
    assert!(text.contains("| [Layer Model](proposals/layers.md) | Accepted |"));
    assert!(!text.contains("{{"));
}

#[test]
fn changelog_sections_stack_newest_first() {
    let dir = fixture();
    let cfg = config::load(dir.path(), None).unwrap();
    let commit = |sha: &str, message: &str| Commit {
        sha: sha.into(),
        message: message.into(),
        author: "amy".into(),
        date: "2024-05-01".into(),
    };
    let release = |version: &str| ChangelogOptions {
        version: version.into(),
        since_tag: None,
        date: "2024-05-01".into(),
        full_rebuild: false,
    };

    changelog::write(dir.path(), &cfg, &release("v1.0.0"), &[commit("aaaaaaa1", "feat: first")], &[]).unwrap();
    changelog::write(dir.path(), &cfg, &release("v1.1.0"), &[commit("bbbbbbb2", "fix: second")], &[]).unwrap();

    let text = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    let newer = text.find("## [1.1.0]").unwrap();
    let older = text.find("## [1.0.0]").unwrap();
    assert!(newer < older);
    assert!(text.contains("### 🐛 Bug Fixes\n\n- second (bbbbbbb by amy)"));
    assert!(text.contains("All notable changes to the handbook project"));
}
