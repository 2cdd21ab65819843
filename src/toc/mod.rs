//! Table-of-contents generation for markdown documents.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::markdown::{self, FenceTracker};

pub const TOC_START: &str = "<!-- TOC_START -->";
pub const TOC_END: &str = "<!-- TOC_END -->";
const TOC_TITLE: &str = "## Table of Contents";

static FORMATTING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`]").expect("valid regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// A heading ready to be listed in a TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: usize,
    pub text: String,
    pub anchor: String,
    pub line: usize,
}

/// What `process_file` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocOutcome {
    Updated { entries: usize },
    AlreadyCurrent,
    NoHeadings,
    NothingInRange,
}

/// Headings outside fenced code and outside an existing TOC block, with
/// inline formatting stripped.
pub fn extract_headings(content: &str) -> Vec<TocEntry> {
    let mut fence = FenceTracker::new();
    let mut in_toc = false;
    let mut out = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if fence.is_code(line) {
            continue;
        }
        let trimmed = line.trim();
        if trimmed == TOC_START {
            in_toc = true;
            continue;
        }
        if trimmed == TOC_END {
            in_toc = false;
            continue;
        }
        if in_toc {
            continue;
        }
        let Some((level, text)) = markdown::parse_heading(line) else {
            continue;
        };
        let clean = FORMATTING.replace_all(text, "");
        let clean = LINK.replace_all(&clean, "$1").into_owned();
        out.push(TocEntry {
            level,
            anchor: anchor(&clean),
            text: clean,
            line: idx + 1,
        });
    }

    out
}

/// GitHub-style heading anchor.
pub fn anchor(text: &str) -> String {
    let lower = text.to_lowercase();
    let dashed = WHITESPACE.replace_all(&lower, "-");
    let kept: String = dashed
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    HYPHENS.replace_all(&kept, "-").trim_matches('-').to_string()
}

/// Render the TOC for headings whose level is within `min_depth..=max_depth`.
///
/// Returns an empty string when no heading qualifies.
pub fn render_toc(headings: &[TocEntry], min_depth: usize, max_depth: usize) -> String {
    let included: Vec<&TocEntry> = headings
        .iter()
        .filter(|h| (min_depth..=max_depth).contains(&h.level))
        .collect();
    let Some(base) = included.iter().map(|h| h.level).min() else {
        return String::new();
    };

    let mut lines = vec![TOC_TITLE.to_string(), String::new()];
    for h in included {
        let indent = " ".repeat((h.level - base) * 2);
        lines.push(format!("{indent}- [{}](#{})", h.text, h.anchor));
    }
    lines.join("\n")
}

/// Replace the TOC between markers, or insert a marked block after the
/// first H1 and its introduction, or append one at the end. Markers and
/// headings inside fenced code are ignored.
pub fn update_content(content: &str, toc: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut fence = FenceTracker::new();
    let in_code: Vec<bool> = lines.iter().map(|l| fence.is_code(l)).collect();
    let marker_at = |marker: &str| (0..lines.len()).find(|&i| !in_code[i] && lines[i].trim() == marker);
    let heading_at = |i: usize| {
        !in_code[i] && lines[i].starts_with('#') && markdown::parse_heading(lines[i]).is_some()
    };

    if let (Some(start), Some(end)) = (marker_at(TOC_START), marker_at(TOC_END))
        && start < end
    {
        let mut out: Vec<&str> = lines[..=start].to_vec();
        out.extend(["", toc, ""]);
        out.extend(&lines[end..]);
        return out.join("\n");
    }

    let block = ["", TOC_START, "", toc, "", TOC_END];
    let first_h1 = (0..lines.len())
        .find(|&i| heading_at(i) && matches!(markdown::parse_heading(lines[i]), Some((1, _))));
    if let Some(h1) = first_h1 {
        let pos = (h1 + 1..lines.len())
            .find(|&i| heading_at(i))
            .unwrap_or(lines.len());
        let mut out: Vec<&str> = lines[..pos].to_vec();
        out.extend(block);
        out.push("");
        out.extend(&lines[pos..]);
        return out.join("\n");
    }

    format!("{content}\n{}", block.join("\n"))
}

/// Heading depths must satisfy `1 <= min <= max <= 6`.
pub fn validate_depth(min_depth: usize, max_depth: usize) -> Result<()> {
    if min_depth == 0 || min_depth > max_depth || max_depth > 6 {
        bail!("invalid heading depth range {min_depth}..={max_depth}; use values from 1 to 6");
    }
    Ok(())
}

/// Regenerate the TOC of one file in place.
pub fn process_file(path: &Path, min_depth: usize, max_depth: usize) -> Result<TocOutcome> {
    validate_depth(min_depth, max_depth)?;
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let headings = extract_headings(&content);
    if headings.is_empty() {
        return Ok(TocOutcome::NoHeadings);
    }
    let toc = render_toc(&headings, min_depth, max_depth);
    if toc.is_empty() {
        return Ok(TocOutcome::NothingInRange);
    }

    let updated = update_content(&content, &toc);
    if updated == content {
        return Ok(TocOutcome::AlreadyCurrent);
    }
    std::fs::write(path, &updated)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(TocOutcome::Updated {
        entries: headings.len(),
    })
}
