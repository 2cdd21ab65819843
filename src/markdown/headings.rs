/// An ATX heading found in a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

/// Tracks whether a line-by-line scan is inside a fenced code block.
#[derive(Debug, Default)]
pub struct FenceTracker {
    in_code: bool,
}

impl FenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line. Returns `true` if the line is a fence or sits
    /// inside a fenced block and must be left alone.
    pub fn is_code(&mut self, line: &str) -> bool {
        if is_fence(line) {
            self.in_code = !self.in_code;
            return true;
        }
        self.in_code
    }

    pub fn in_code(&self) -> bool {
        self.in_code
    }
}

/// True for a line opening or closing a fenced code block.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Parse an ATX heading line (`#` to `######`, whitespace, text).
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((level, text))
}

/// All headings outside fenced code blocks, in document order.
pub fn headings(content: &str) -> Vec<Heading> {
    let mut fence = FenceTracker::new();
    let mut out = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if fence.is_code(line) {
            continue;
        }
        if let Some((level, text)) = parse_heading(line) {
            out.push(Heading {
                level,
                text: text.to_string(),
                line: idx + 1,
            });
        }
    }

    out
}
