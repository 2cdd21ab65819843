//! CI step outputs (`$GITHUB_OUTPUT`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Append `key=value` lines to the file named by `$GITHUB_OUTPUT`.
///
/// Does nothing outside a GitHub Actions job.
pub fn publish(pairs: &[(&str, String)]) -> Result<()> {
    let Some(path) = std::env::var_os("GITHUB_OUTPUT") else {
        tracing::debug!("GITHUB_OUTPUT not set, skipping step outputs");
        return Ok(());
    };
    append(Path::new(&path), pairs)
}

/// True when running inside GitHub Actions.
pub fn in_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| !v.is_empty())
}

pub fn append(path: &Path, pairs: &[(&str, String)]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open step output file {}", path.display()))?;
    for (key, value) in pairs {
        writeln!(file, "{key}={value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_adds_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        std::fs::write(&path, "existing=1\n").unwrap();

        append(&path, &[("consistent", "true".into()), ("total", "4".into())]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "existing=1\nconsistent=true\ntotal=4\n");
    }
}
