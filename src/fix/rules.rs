use std::sync::LazyLock;

use regex::Regex;

use crate::markdown::{FenceTracker, is_fence, parse_heading};

use super::FixOptions;

static STRONG_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").expect("valid regex"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-*+]|\d+\.)(\s+)").expect("valid regex"));

/// A single markdown rewrite.
pub struct Rule {
    pub id: &'static str,
    pub description: &'static str,
    pub apply: fn(&str, &FixOptions) -> String,
}

/// All rules, in the order they are applied.
pub static RULES: [Rule; 6] = [
    Rule {
        id: "emphasis-style",
        description: "Use ** for strong and _ for emphasis",
        apply: |c, _| fix_emphasis_style(c),
    },
    Rule {
        id: "blanks-around-headings",
        description: "Surround headings with blank lines and collapse blank runs",
        apply: |c, _| fix_blank_lines_around_headings(c),
    },
    Rule {
        id: "blanks-around-lists",
        description: "Surround lists with blank lines",
        apply: |c, _| fix_blank_lines_around_lists(c),
    },
    Rule {
        id: "fenced-code-language",
        description: "Give bare code fences a language",
        apply: |c, _| fix_code_block_languages(c),
    },
    Rule {
        id: "line-length",
        description: "Wrap long prose lines",
        apply: |c, opts| fix_line_length(c, opts.max_line_length),
    },
    Rule {
        id: "single-trailing-newline",
        description: "End the file with exactly one newline",
        apply: |c, _| fix_trailing_newline(c),
    },
];

/// Apply `f` to every line outside fenced code, keeping fences and code as is.
fn map_prose_lines(content: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut fence = FenceTracker::new();
    content
        .split('\n')
        .map(|line| {
            if fence.is_code(line) {
                line.to_string()
            } else {
                f(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply `f` to the parts of `line` outside inline code spans.
fn map_outside_inline_code(line: &str, f: impl Fn(&str) -> String) -> String {
    line.split('`')
        .enumerate()
        .map(|(i, part)| if i % 2 == 0 { f(part) } else { part.to_string() })
        .collect::<Vec<_>>()
        .join("`")
}

// ── Emphasis ─────────────────────────────────────────────────────────────

pub fn fix_emphasis_style(content: &str) -> String {
    map_prose_lines(content, |line| {
        map_outside_inline_code(line, |part| {
            let strong = STRONG_UNDERSCORE.replace_all(part, "**$1**");
            asterisk_italics_to_underscore(&strong)
        })
    })
}

/// Rewrite `*text*` as `_text_`, leaving `**strong**`, list bullets and
/// free-standing asterisks alone.
fn asterisk_italics_to_underscore(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = chars.clone();
    let is_star = |i: usize| chars.get(i) == Some(&'*');

    let mut i = 0;
    while i < chars.len() {
        let opens = is_star(i)
            && !(i > 0 && is_star(i - 1))
            && !is_star(i + 1)
            && chars.get(i + 1).is_some_and(|c| !c.is_whitespace());
        if !opens {
            i += 1;
            continue;
        }

        let close = (i + 1..chars.len()).find(|&j| is_star(j));
        match close {
            Some(j)
                if j > i + 1
                    && !chars[j - 1].is_whitespace()
                    && !is_star(j + 1) =>
            {
                out[i] = '_';
                out[j] = '_';
                i = j + 1;
            }
            Some(j) => i = j,
            None => break,
        }
    }

    out.into_iter().collect()
}

// ── Blank lines ──────────────────────────────────────────────────────────

fn is_heading_line(line: &str) -> bool {
    line.starts_with('#') && parse_heading(line).is_some()
}

fn last_is_blank(lines: &[String]) -> bool {
    lines.last().is_some_and(|l| l.trim().is_empty())
}

pub fn fix_blank_lines_around_headings(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut fixed: Vec<String> = Vec::with_capacity(lines.len());
    let mut fence = FenceTracker::new();

    for (i, line) in lines.iter().enumerate() {
        if fence.is_code(line) {
            fixed.push(line.to_string());
            continue;
        }

        if is_heading_line(line) {
            if !fixed.is_empty() && !last_is_blank(&fixed) {
                fixed.push(String::new());
            }
            fixed.push(line.to_string());
            if let Some(next) = lines.get(i + 1)
                && !next.trim().is_empty()
                && !next.starts_with('#')
            {
                fixed.push(String::new());
            }
        } else if !line.is_empty() || !fixed.last().is_some_and(|l| l.is_empty()) {
            fixed.push(line.to_string());
        }
    }

    fixed.join("\n")
}

fn is_list_item(line: &str) -> bool {
    LIST_MARKER.is_match(line.trim_start())
}

pub fn fix_blank_lines_around_lists(content: &str) -> String {
    let mut fixed: Vec<String> = Vec::new();
    let mut fence = FenceTracker::new();
    let mut in_list = false;

    for line in content.split('\n') {
        let opens_block = is_fence(line) && !fence.in_code();
        if opens_block && in_list && !line.starts_with([' ', '\t']) {
            if !last_is_blank(&fixed) {
                fixed.push(String::new());
            }
            in_list = false;
        }
        if fence.is_code(line) {
            fixed.push(line.to_string());
            continue;
        }

        if is_list_item(line) {
            if !in_list {
                if !fixed.is_empty() && !last_is_blank(&fixed) {
                    fixed.push(String::new());
                }
                in_list = true;
            }
        } else if in_list && !line.trim().is_empty() {
            let continuation = line.starts_with([' ', '\t']) && !last_is_blank(&fixed);
            if !continuation {
                if !last_is_blank(&fixed) {
                    fixed.push(String::new());
                }
                in_list = false;
            }
        }
        fixed.push(line.to_string());
    }

    fixed.join("\n")
}

// ── Code fences ──────────────────────────────────────────────────────────

pub fn fix_code_block_languages(content: &str) -> String {
    let mut in_code = false;
    content
        .split('\n')
        .map(|line| {
            if !is_fence(line) {
                return line.to_string();
            }
            let opening = !in_code;
            in_code = !in_code;
            if opening && line.trim() == "```" {
                format!("{line}text")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Line length ──────────────────────────────────────────────────────────

pub fn fix_line_length(content: &str, max_length: usize) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut fence = FenceTracker::new();

    for line in content.split('\n') {
        if fence.is_code(line) || !should_wrap(line, max_length) {
            out.push(line.to_string());
            continue;
        }
        out.extend(wrap_line(line, max_length));
    }

    out.join("\n")
}

fn should_wrap(line: &str, max_length: usize) -> bool {
    let trimmed = line.trim_start();
    line.chars().count() > max_length
        && !trimmed.starts_with('|')
        && !is_heading_line(trimmed)
        && !line.contains("http")
        && !line.contains("www.")
}

/// Split a line into (first-line prefix, continuation prefix, body).
fn split_prefix(line: &str) -> (String, String, &str) {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);

    if let Some(body) = rest.strip_prefix("> ") {
        let prefix = format!("{indent}> ");
        return (prefix.clone(), prefix, body);
    }
    if let Some(caps) = LIST_MARKER.captures(rest) {
        let marker_len = caps[0].len();
        let prefix = format!("{indent}{}", &rest[..marker_len]);
        let continuation = format!("{indent}{}", " ".repeat(marker_len));
        return (prefix, continuation, &rest[marker_len..]);
    }
    (indent.to_string(), indent.to_string(), rest)
}

/// True when `word` at the start of a line would begin a heading, list
/// item or blockquote. Such words stay on the line before.
fn opens_block(word: &str) -> bool {
    let hashes = word.chars().take_while(|&c| c == '#').count();
    (hashes > 0 && hashes == word.len() && hashes <= 6)
        || word.starts_with('>')
        || LIST_MARKER.is_match(&format!("{word} "))
}

fn wrap_line(line: &str, max_length: usize) -> Vec<String> {
    let (first_prefix, continuation, body) = split_prefix(line);
    let mut lines = Vec::new();
    let mut prefix = first_prefix;
    let mut current = String::new();

    for word in body.split_whitespace() {
        let candidate = prefix.chars().count() + current.chars().count() + 1 + word.chars().count();
        if current.is_empty() {
            current.push_str(word);
        } else if candidate <= max_length || opens_block(word) {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(format!("{prefix}{current}"));
            prefix = continuation.clone();
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(format!("{prefix}{current}"));
    }
    lines
}

// ── Trailing newline ─────────────────────────────────────────────────────

pub fn fix_trailing_newline(content: &str) -> String {
    format!("{}\n", content.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_underscores_become_asterisks() {
        assert_eq!(fix_emphasis_style("a __b__ c"), "a **b** c");
    }

    #[test]
    fn single_asterisks_become_underscores() {
        assert_eq!(fix_emphasis_style("an *important* word"), "an _important_ word");
        assert_eq!(fix_emphasis_style("**bold** stays"), "**bold** stays");
        assert_eq!(
            fix_emphasis_style("**bold** and *it*"),
            "**bold** and _it_"
        );
    }

    #[test]
    fn emphasis_leaves_bullets_math_and_code() {
        assert_eq!(fix_emphasis_style("* item one"), "* item one");
        assert_eq!(fix_emphasis_style("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(fix_emphasis_style("use `*args*` here"), "use `*args*` here");
        let fenced = "```python\nx = *a*\n```";
        assert_eq!(fix_emphasis_style(fenced), fenced);
    }

    #[test]
    fn emphasis_is_line_scoped() {
        assert_eq!(fix_emphasis_style("* one\n* two"), "* one\n* two");
    }

    #[test]
    fn headings_get_blank_lines() {
        let input = "Intro\n# Title\nText\n\n\n\nMore";
        assert_eq!(
            fix_blank_lines_around_headings(input),
            "Intro\n\n# Title\n\nText\n\nMore"
        );
    }

    #[test]
    fn consecutive_headings_stay_adjacent_to_blank() {
        let input = "# A\n## B\nbody";
        assert_eq!(fix_blank_lines_around_headings(input), "# A\n\n## B\n\nbody");
    }

    #[test]
    fn headings_in_code_untouched() {
        let input = "```sh\n# comment\ntext\n```";
        assert_eq!(fix_blank_lines_around_headings(input), input);
    }

    #[test]
    fn lists_get_blank_lines() {
        let input = "Before\n- a\n- b\nAfter";
        assert_eq!(fix_blank_lines_around_lists(input), "Before\n\n- a\n- b\n\nAfter");
    }

    #[test]
    fn list_continuations_and_existing_blanks() {
        let input = "- a\n  more of a\n- b\n\nAfter\n1. one\n2. two";
        assert_eq!(
            fix_blank_lines_around_lists(input),
            "- a\n  more of a\n- b\n\nAfter\n\n1. one\n2. two"
        );
    }

    #[test]
    fn only_opening_fences_get_language() {
        let input = "```\ncode\n```\n\n```rust\nfn x() {}\n```";
        assert_eq!(
            fix_code_block_languages(input),
            "```text\ncode\n```\n\n```rust\nfn x() {}\n```"
        );
    }

    #[test]
    fn long_lines_wrap_at_words() {
        let input = "one two three four five six";
        assert_eq!(fix_line_length(input, 10), "one two\nthree four\nfive six");
    }

    #[test]
    fn long_list_items_keep_hanging_indent() {
        let input = "- alpha beta gamma delta";
        assert_eq!(fix_line_length(input, 12), "- alpha beta\n  gamma\n  delta");
    }

    #[test]
    fn wrapping_never_starts_a_block() {
        assert_eq!(
            fix_line_length("Please look at issue # 42 in the tracker today", 20),
            "Please look at issue #\n42 in the tracker\ntoday"
        );
        assert_eq!(
            fix_line_length("Values go from one - to two", 12),
            "Values go\nfrom one -\nto two"
        );
        assert_eq!(
            fix_line_length("Pick option 2. or quote > this", 13),
            "Pick option 2.\nor quote >\nthis"
        );
    }

    #[test]
    fn long_lines_left_alone_when_special() {
        let url = format!("See https://example.com/{}", "x".repeat(50));
        let table = format!("| {} |", "cell ".repeat(20));
        let heading = format!("## {}", "word ".repeat(20));
        for line in [url, table, heading] {
            assert_eq!(fix_line_length(&line, 20), line);
        }
        let code = format!("```\n{}\n```", "tok ".repeat(20));
        assert_eq!(fix_line_length(&code, 20), code);
    }

    #[test]
    fn trailing_newline_normalized() {
        assert_eq!(fix_trailing_newline("text\n\n\n"), "text\n");
        assert_eq!(fix_trailing_newline("text"), "text\n");
    }

    #[test]
    fn rules_are_ordered() {
        let ids: Vec<&str> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(ids.first(), Some(&"emphasis-style"));
        assert_eq!(ids.last(), Some(&"single-trailing-newline"));
    }
}
