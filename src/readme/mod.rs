//! README compilation from a template and the current repository state.
mod sections;

pub use sections::{
    ProjectStats, contributing_info, documentation_links, footer, project_description,
    proposal_listing, workflow_badges,
};

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::templates;

/// The README template: the configured template file, else the current
/// README, else the built-in default.
pub fn load_template(root: &Path, cfg: &Config) -> Result<String> {
    for candidate in [&cfg.readme.template, &cfg.readme.output] {
        let path = root.join(candidate);
        if path.is_file() {
            tracing::debug!("using README template {}", path.display());
            return std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    Ok(templates::builtin(templates::README)?.to_string())
}

/// Every section value keyed by its placeholder name.
pub fn sections(root: &Path, cfg: &Config, stats: &ProjectStats) -> Vec<(&'static str, String)> {
    let repo = cfg.repository();
    let name = cfg.project_name(root);
    vec![
        ("project_name", name.clone()),
        ("project_description", project_description(&cfg.readme)),
        (
            "workflow_badges",
            workflow_badges(root, repo.as_deref(), &cfg.github.web_url, &cfg.readme),
        ),
        ("project_stats", stats.headline()),
        (
            "proposal_listing",
            proposal_listing(root, &cfg.readme.proposals_dir),
        ),
        ("contributing_info", contributing_info(root, &name)),
        ("documentation_links", documentation_links(root)),
        ("footer", footer(stats)),
    ]
}

/// Fill `template` with the section values.
pub fn compile(template: &str, sections: &[(&str, String)]) -> String {
    templates::fill(template, sections)
}

/// Compile and write the README. Returns the statistics it was built with.
pub fn run(root: &Path, cfg: &Config) -> Result<ProjectStats> {
    println!("🔧 Compiling dynamic README...");
    let stats = ProjectStats::from_env(Utc::now());
    let template = load_template(root, cfg)?;
    let compiled = compile(&template, &sections(root, cfg, &stats));

    let path = root.join(&cfg.readme.output);
    std::fs::write(&path, compiled).with_context(|| format!("failed to write {}", path.display()))?;
    println!("✅ README compilation completed successfully!");
    Ok(stats)
}

pub fn print_summary(stats: &ProjectStats) {
    println!("📊 Project Statistics:");
    println!("   - Contributors: {}", stats.contributors);
    println!("   - Commits: {}", stats.commits);
    println!("   - Proposals: {}", stats.proposals);
    println!("   - Workflows: {}", stats.workflows);
    println!("   - Last Updated: {}", stats.last_updated);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn template_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::default();

        let builtin = load_template(dir.path(), &cfg).unwrap();
        assert!(builtin.contains("{{ footer }}"));

        fs::write(dir.path().join("README.md"), "current {{ footer }}").unwrap();
        assert_eq!(load_template(dir.path(), &cfg).unwrap(), "current {{ footer }}");

        fs::create_dir_all(dir.path().join(".github")).unwrap();
        fs::write(dir.path().join(".github/readme-template.md"), "tpl").unwrap();
        assert_eq!(load_template(dir.path(), &cfg).unwrap(), "tpl");
    }

    #[test]
    fn project_name_from_slug() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            repository: Some("acme/handbook".into()),
            ..Config::default()
        };
        assert_eq!(cfg.project_name(dir.path()), "handbook");

        let named = dir.path().join("field-guide");
        fs::create_dir(&named).unwrap();
        let cfg = Config {
            repository: Some("acme/".into()),
            ..Config::default()
        };
        assert_eq!(cfg.project_name(&named), "field-guide");
    }

    #[test]
    fn run_writes_compiled_readme() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            repository: Some("acme/handbook".into()),
            ..Config::default()
        };
        fs::create_dir_all(dir.path().join(".github")).unwrap();
        fs::write(
            dir.path().join(".github/readme-template.md"),
            "# {{ project_name }}\n\n{{ proposal_listing }}\n{{ unknown_key }}\n",
        )
        .unwrap();

        run(dir.path(), &cfg).unwrap();
        let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert_eq!(readme, "# handbook\n\n_No proposals directory found._\n\n");
    }
}
