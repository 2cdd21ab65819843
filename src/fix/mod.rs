// Markdown autofix: normalize emphasis, spacing, fences and line length.
mod rules;

pub use rules::{
    RULES, Rule, fix_blank_lines_around_headings, fix_blank_lines_around_lists,
    fix_code_block_languages, fix_emphasis_style, fix_line_length, fix_trailing_newline,
};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use similar::{ChangeTag, TextDiff};

use crate::config::FixConfig;
use crate::markdown;

/// Tunables passed to every rule.
#[derive(Debug, Clone)]
pub struct FixOptions {
    pub max_line_length: usize,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            max_line_length: 120,
        }
    }
}

impl From<&FixConfig> for FixOptions {
    fn from(cfg: &FixConfig) -> Self {
        Self {
            max_line_length: cfg.max_line_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Insert(String),
    Delete(String),
    HunkHeader(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Content changed (and was written unless checking).
    Fixed,
    Unchanged,
}

#[derive(Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Rules that changed something, in application order.
    pub rules: Vec<&'static Rule>,
    pub diff: Vec<DiffLine>,
}

/// Totals of a `run` over several files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub checked: usize,
    pub changed: usize,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
    pub check: bool,
}

impl FixSummary {
    /// Missing or failed files always fail; in check mode any pending
    /// change fails too.
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty() && !(self.check && self.changed > 0)
    }
}

/// Run every rule over `content`.
pub fn fix_content(content: &str, opts: &FixOptions) -> String {
    apply_rules(content, opts).0
}

fn apply_rules(content: &str, opts: &FixOptions) -> (String, Vec<&'static Rule>) {
    let mut applied = Vec::new();
    let mut text = content.to_string();
    for rule in &RULES {
        let next = (rule.apply)(&text, opts);
        if next != text {
            tracing::debug!(rule = rule.id, "{}", rule.description);
            applied.push(rule);
            text = next;
        }
    }
    (text, applied)
}

/// Fix one file. With `check` set the file is never written; the outcome
/// still reports whether it would change.
pub fn fix_file(path: &Path, opts: &FixOptions, check: bool) -> Result<FileOutcome> {
    let original = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading {}", path.display()))?;
    let (fixed, rules) = apply_rules(&original, opts);

    if fixed == original {
        return Ok(FileOutcome {
            path: path.to_path_buf(),
            status: FileStatus::Unchanged,
            rules,
            diff: Vec::new(),
        });
    }

    if !check {
        std::fs::write(path, &fixed)
            .with_context(|| format!("Error writing {}", path.display()))?;
    }

    Ok(FileOutcome {
        path: path.to_path_buf(),
        status: FileStatus::Fixed,
        rules,
        diff: make_unified_diff(&original, &fixed),
    })
}

/// Fix (or with `check`, only diff) every target file and report totals.
///
/// Targets come from `resolve_targets`. Missing files are warned about
/// and counted; read or write failures are logged and counted.
pub fn run(root: &Path, files: &[PathBuf], cfg: &FixConfig, check: bool) -> FixSummary {
    let opts = FixOptions::from(cfg);
    let targets = resolve_targets(root, files, cfg);
    let mut summary = FixSummary {
        check,
        ..FixSummary::default()
    };
    if targets.is_empty() {
        println!("⚠️  No markdown files to fix");
        return summary;
    }

    for path in targets {
        if !path.is_file() {
            tracing::warn!("file not found: {}", markdown::relative_display(root, &path));
            summary.missing.push(path);
            continue;
        }
        summary.checked += 1;
        match fix_file(&path, &opts, check) {
            Ok(outcome) => report(root, &outcome, check, &mut summary),
            Err(e) => {
                tracing::error!("{e:#}");
                summary.failed.push(path);
            }
        }
    }

    let verb = if check { "would change" } else { "fixed" };
    println!("\n📊 {} of {} files {verb}", summary.changed, summary.checked);
    summary
}

fn report(root: &Path, outcome: &FileOutcome, check: bool, summary: &mut FixSummary) {
    let name = markdown::relative_display(root, &outcome.path);
    if outcome.status == FileStatus::Unchanged {
        println!("ℹ️  No changes needed for {name}");
        return;
    }
    summary.changed += 1;
    if check {
        print!("{}", render_diff(&name, &outcome.diff));
    } else {
        println!("✅ Fixed {name}");
        for rule in &outcome.rules {
            println!("   - {}", rule.description);
        }
    }
}

/// Files to fix: explicit arguments first, then the configured list, then
/// every markdown file under `root`. Relative paths resolve against `root`.
pub fn resolve_targets(root: &Path, args: &[PathBuf], cfg: &FixConfig) -> Vec<PathBuf> {
    if !args.is_empty() {
        return args.iter().map(|p| root.join(p)).collect();
    }
    if !cfg.files.is_empty() {
        return cfg.files.iter().map(|p| root.join(p)).collect();
    }
    markdown::discover_markdown(root, &cfg.skip_dirs)
}

fn make_unified_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let text_diff = TextDiff::from_lines(old, new);
    let mut lines = Vec::new();

    for hunk in text_diff.unified_diff().context_radius(3).iter_hunks() {
        lines.push(DiffLine::HunkHeader(format!("{}", hunk.header())));
        for change in hunk.iter_changes() {
            let text = change.value().trim_end_matches('\n').to_string();
            match change.tag() {
                ChangeTag::Equal => lines.push(DiffLine::Context(text)),
                ChangeTag::Insert => lines.push(DiffLine::Insert(text)),
                ChangeTag::Delete => lines.push(DiffLine::Delete(text)),
            }
        }
    }

    lines
}

/// Render a diff in unified format with `--- a/` / `+++ b/` headers.
pub fn render_diff(name: &str, diff: &[DiffLine]) -> String {
    let mut out = format!("--- a/{name}\n+++ b/{name}\n");
    for line in diff {
        match line {
            DiffLine::HunkHeader(h) => out.push_str(h.trim_end()),
            DiffLine::Context(t) => {
                out.push(' ');
                out.push_str(t);
            }
            DiffLine::Insert(t) => {
                out.push('+');
                out.push_str(t);
            }
            DiffLine::Delete(t) => {
                out.push('-');
                out.push_str(t);
            }
        }
        out.push('\n');
    }
    out
}
