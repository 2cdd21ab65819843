//! Built-in templates and `{{ key }}` placeholder filling.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};
use regex::Regex;

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

static LEFTOVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*\w+\s*\}\}").expect("valid regex"));

pub const README: &str = "readme.md";
pub const CHANGELOG_HEADER: &str = "changelog-header.md";

/// Contents of an embedded template.
pub fn builtin(name: &str) -> Result<&'static str> {
    TEMPLATES
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .with_context(|| format!("built-in template '{name}' is missing"))
}

/// Replace every `{{ key }}` with its value, then drop placeholders that
/// had no value.
pub fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{{ {key} }}}}"), value);
    }
    LEFTOVER.replace_all(&out, "").into_owned()
}
