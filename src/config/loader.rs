use std::path::Path;

use anyhow::{Context, Result, bail};

use super::types::Config;

/// Default config file name, looked up in the repository root.
pub const CONFIG_FILE: &str = ".docmaint.yaml";

/// Load config from `explicit`, or from `.docmaint.yaml` in `root`.
///
/// A missing default file yields `Config::default()`; a missing explicit
/// file is an error.
pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => {
            if !p.is_file() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = root.join(CONFIG_FILE);
            if !p.is_file() {
                return Ok(Config::default());
            }
            p
        }
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid config in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
