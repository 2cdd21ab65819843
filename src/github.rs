//! Minimal blocking client for the GitHub REST endpoints the jobs need.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::blocking::Response;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::GithubConfig;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const AGENT: &str = concat!("docmaint/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GithubError {
    #[error("rate limited by the GitHub API; set GITHUB_TOKEN for authenticated requests")]
    RateLimited,

    #[error("GitHub API returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid GitHub API URL: {0}")]
    InvalidUrl(String),

    #[error("GITHUB_TOKEN contains characters not allowed in a header")]
    InvalidToken,

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One workflow run, as returned by the Actions API.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// A pull request from the pulls listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub user: User,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
}

pub struct Client {
    http: reqwest::blocking::Client,
    api_url: String,
}

impl Client {
    /// Build a client. Without a token requests are unauthenticated and
    /// subject to much lower rate limits.
    pub fn new(cfg: &GithubConfig, token: Option<&str>) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));
        match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("token {}", token.trim()))
                    .map_err(|_| GithubError::InvalidToken)?;
                headers.insert(AUTHORIZATION, value);
            }
            None => tracing::warn!("no GITHUB_TOKEN provided, using unauthenticated requests"),
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Runs of `workflow` created after `since` (first page of 100).
    pub fn workflow_runs(
        &self,
        repo: &str,
        workflow: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkflowRun>, GithubError> {
        let created = format!(">{}", since.format("%Y-%m-%dT%H:%M:%SZ"));
        let page: RunsPage = self.get(
            &format!("repos/{repo}/actions/workflows/{workflow}/runs"),
            &[("per_page", "100"), ("created", created.as_str())],
        )?;
        Ok(page.workflow_runs)
    }

    /// Recently updated closed pull requests (first page of 100).
    pub fn closed_pulls(&self, repo: &str) -> Result<Vec<PullRequest>, GithubError> {
        self.get(
            &format!("repos/{repo}/pulls"),
            &[
                ("state", "closed"),
                ("sort", "updated"),
                ("direction", "desc"),
                ("per_page", "100"),
            ],
        )
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, GithubError> {
        let url = Url::parse_with_params(&format!("{}/{path}", self.api_url), query)
            .map_err(|e| GithubError::InvalidUrl(e.to_string()))?;
        tracing::debug!(%url, "GET");
        let response = self.http.get(url.clone()).send()?;
        let response = check_status(response, url.as_str())?;
        Ok(response.json()?)
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    let body = response.text().unwrap_or_default();
    if is_rate_limited(status.as_u16(), exhausted, &body) {
        return Err(GithubError::RateLimited);
    }
    Err(GithubError::Status {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

fn is_rate_limited(status: u16, exhausted: bool, body: &str) -> bool {
    matches!(status, 403 | 429) && (exhausted || body.to_ascii_lowercase().contains("rate limit"))
}
