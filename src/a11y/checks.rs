use std::sync::LazyLock;

use regex::Regex;

use crate::markdown;

use super::Issue;

static EMPTY_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\]\([^)]+\)").expect("valid regex"));
static BLANK_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\s+\]\([^)]+\)").expect("valid regex"));

/// Report headings that skip a level relative to the previous heading.
///
/// The first heading may start at any level.
pub fn check_heading_hierarchy(content: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut prev_level = 0;

    for heading in markdown::headings(content) {
        if prev_level > 0 && heading.level > prev_level + 1 {
            issues.push(Issue::new(
                "heading-hierarchy",
                format!(
                    "Heading level jump: '{}' (H{} after H{})",
                    heading.text, heading.level, prev_level
                ),
            ));
        }
        prev_level = heading.level;
    }

    issues
}

/// Report images with missing or whitespace-only alt text.
pub fn check_alt_text(content: &str) -> Vec<Issue> {
    let mut issues: Vec<Issue> = EMPTY_ALT
        .find_iter(content)
        .map(|m| Issue::new("alt-text", format!("Image without alt text: {}", m.as_str())))
        .collect();

    issues.extend(BLANK_ALT.find_iter(content).map(|m| {
        Issue::new(
            "alt-text",
            format!("Image with empty alt text: {}", m.as_str()),
        )
    }));

    issues
}

/// Report link texts that say nothing about their target, one issue per
/// phrase with its occurrence count.
pub fn check_link_text(content: &str, phrases: &[String]) -> Vec<Issue> {
    let mut issues = Vec::new();

    for phrase in phrases {
        let pattern = format!(r"(?i)\[{}\]", regex::escape(phrase));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        let count = re.find_iter(content).count();
        if count > 0 {
            issues.push(Issue::new(
                "link-text",
                format!("Non-descriptive link text: '{phrase}' ({count} occurrence(s))"),
            ));
        }
    }

    issues
}
