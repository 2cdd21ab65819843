use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

const LOG_FORMAT: &str = "--pretty=format:%H|%s|%an|%ad";

/// One commit from `git log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

/// Commits reachable from HEAD, newest first. With `since_tag` only the
/// commits after that tag are listed.
pub fn git_commits(root: &Path, since_tag: Option<&str>, extra_args: &[String]) -> Result<Vec<Commit>> {
    let mut args = vec!["log".to_string(), LOG_FORMAT.to_string(), "--date=short".to_string()];
    args.extend(extra_args.iter().cloned());
    if let Some(tag) = since_tag {
        args.push(format!("{tag}..HEAD"));
    }
    let stdout = run_git(root, &args)?;
    Ok(parse_log(&stdout))
}

/// Author date of `tag` as `YYYY-MM-DD`.
pub fn tag_date(root: &Path, tag: &str) -> Result<Option<String>> {
    let args = ["log", "-1", "--format=%ad", "--date=short", tag].map(String::from);
    let stdout = run_git(root, &args)?;
    let date = stdout.trim();
    Ok((!date.is_empty()).then(|| date.to_string()))
}

/// Parse `sha|subject|author|date` lines. The subject may itself contain
/// `|`, so author and date are taken from the right.
pub fn parse_log(text: &str) -> Vec<Commit> {
    text.lines()
        .filter_map(|line| {
            let (sha, rest) = line.split_once('|')?;
            let mut tail = rest.rsplitn(3, '|');
            let date = tail.next()?;
            let author = tail.next()?;
            let message = tail.next()?;
            Some(Commit {
                sha: sha.to_string(),
                message: message.to_string(),
                author: author.to_string(),
                date: date.to_string(),
            })
        })
        .collect()
}

fn run_git(root: &Path, args: &[String]) -> Result<String> {
    tracing::debug!("git {}", args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .context("failed to invoke `git`; is it installed and on PATH?")?;

    if !output.status.success() {
        bail!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_lines() {
        let text = "\
abc1234def|feat(toc): add generator|Ada Lovelace|2024-05-02
0123456789|fix: handle a|b pipes|Grace|2024-05-01
garbage line
";
        let commits = parse_log(text);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, "abc1234def");
        assert_eq!(commits[0].message, "feat(toc): add generator");
        assert_eq!(commits[0].author, "Ada Lovelace");
        assert_eq!(commits[1].message, "fix: handle a|b pipes");
        assert_eq!(commits[1].author, "Grace");
        assert_eq!(commits[1].date, "2024-05-01");
    }

    #[test]
    fn empty_log_has_no_commits() {
        assert!(parse_log("").is_empty());
    }

    #[test]
    fn outside_a_repository_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(git_commits(dir.path(), None, &[]).is_err());
    }
}
