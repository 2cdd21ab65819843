use std::collections::BTreeSet;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

const SEMVER: &str = r"[0-9]+\.[0-9]+\.[0-9]+";

static CHANGELOG_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)##\s*\[({SEMVER}[^\]]*?)\]"),
        format!(r"(?i)##\s*v?({SEMVER}\S*)"),
        format!(r"(?i)#\s*v?({SEMVER}\S*)"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static REFERENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)Version\s+({SEMVER}\S*)"),
        format!(r"(?i)v({SEMVER}\S*)"),
        format!(r"(?i)version:\s*({SEMVER}\S*)"),
        format!(r"(?i)\[({SEMVER}[^\]]*?)\]"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Top-level `version` of a `package.json`.
pub fn from_package_json(content: &str) -> Result<Option<String>> {
    let doc: serde_json::Value = serde_json::from_str(content).context("invalid JSON")?;
    Ok(doc
        .get("version")
        .and_then(|v| v.as_str())
        .map(String::from))
}

/// First version found in the usual `pyproject.toml` locations.
pub fn from_pyproject(content: &str) -> Result<Option<String>> {
    let doc: toml::Table = toml::from_str(content).context("invalid TOML")?;
    const LOCATIONS: [&[&str]; 4] = [
        &["project", "version"],
        &["tool", "poetry", "version"],
        &["tool", "setuptools", "version"],
        &["version"],
    ];
    Ok(LOCATIONS
        .iter()
        .find_map(|keys| toml_lookup(&doc, keys).and_then(toml_scalar)))
}

/// `package.version` of a `Cargo.toml`, falling back to
/// `workspace.package.version`. An inherited `version.workspace = true`
/// carries no version of its own.
pub fn from_cargo_toml(content: &str) -> Result<Option<String>> {
    let doc: toml::Table = toml::from_str(content).context("invalid TOML")?;
    Ok(toml_lookup(&doc, &["package", "version"])
        .and_then(|v| v.as_str())
        .or_else(|| toml_lookup(&doc, &["workspace", "package", "version"]).and_then(|v| v.as_str()))
        .map(String::from))
}

/// Contents of a plain `VERSION` file, without a leading `v`.
pub fn from_text_file(content: &str) -> Option<String> {
    let trimmed = content.trim();
    let version = trimmed.strip_prefix('v').unwrap_or(trimmed);
    (!version.is_empty()).then(|| version.to_string())
}

/// Latest release heading of a changelog (the first one in the file).
pub fn from_changelog(content: &str) -> Option<String> {
    CHANGELOG_PATTERNS.iter().find_map(|re| {
        re.captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Every distinct version mentioned in a markdown document, sorted.
pub fn references_in_markdown(content: &str) -> Vec<String> {
    let mut found = BTreeSet::new();
    for re in REFERENCE_PATTERNS.iter() {
        for caps in re.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                let v = m.as_str().trim_end_matches(['.', ',', ';', ':', ')', '*', '`']);
                found.insert(v.to_string());
            }
        }
    }
    found.into_iter().collect()
}

fn toml_lookup<'a>(table: &'a toml::Table, keys: &[&str]) -> Option<&'a toml::Value> {
    let (first, rest) = keys.split_first()?;
    let mut current = table.get(*first)?;
    for key in rest {
        current = current.as_table()?.get(*key)?;
    }
    Some(current)
}

fn toml_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}
