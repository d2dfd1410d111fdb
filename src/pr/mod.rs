pub mod diff;
pub mod types;

pub use types::{PrFacts, PrFile, PrUrl};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument};

const USER_AGENT: &str = "pr-review";
const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub token required to fetch PR data")]
    MissingToken,

    #[error("{0}")]
    InvalidUrl(String),

    #[error("GitHub authentication failed ({0}). Check GITHUB_TOKEN.")]
    Auth(StatusCode),

    #[error("Pull request not found (404).")]
    NotFound,

    #[error("GitHub fetch failed: {0}")]
    Fetch(String),
}

impl From<reqwest::Error> for PrError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => classify_status(status),
            None => PrError::Fetch(err.to_string()),
        }
    }
}

fn classify_status(status: StatusCode) -> PrError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PrError::Auth(status),
        StatusCode::NOT_FOUND => PrError::NotFound,
        other => PrError::Fetch(format!("GitHub API returned {other}")),
    }
}

/// Source of pull request facts. The reviewer only talks to GitHub through
/// this trait so it can be swapped out in tests.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetch title, author, unified diff and file list for a PR URL.
    async fn fetch(&self, pr_url: &str, token: Option<&str>) -> Result<PrFacts, PrError>;
}

/// Parse a GitHub PR URL into its component parts.
///
/// Accepts `https://github.com/{owner}/{repo}/pull/{number}` and the
/// `/pulls/` spelling; trailing segments such as `/files` are ignored.
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|_| PrError::InvalidUrl("Invalid GitHub PR URL".to_string()))?;

    if !parsed.host_str().is_some_and(|h| h.contains("github.com")) {
        return Err(PrError::InvalidUrl("Not a GitHub URL".to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .map(|s| s.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 4 || (segments[2] != "pull" && segments[2] != "pulls") {
        return Err(PrError::InvalidUrl("Invalid GitHub PR path".to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl("Invalid GitHub PR URL".to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Thin GitHub REST client: one metadata read, one diff read, one file list read.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get(&self, url: &str, token: &str, accept: &str) -> Result<reqwest::Response, PrError> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }
        Ok(response)
    }
}

#[derive(serde::Deserialize)]
struct User {
    login: String,
}

#[derive(serde::Deserialize)]
struct PullResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

#[derive(serde::Deserialize)]
struct FileEntry {
    filename: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    #[instrument(skip(self, token))]
    async fn fetch(&self, pr_url: &str, token: Option<&str>) -> Result<PrFacts, PrError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(PrError::MissingToken)?;
        let url = parse_pr_url(pr_url)?;
        let base_url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, url.owner, url.repo, url.pr_number
        );

        debug!(owner = %url.owner, repo = %url.repo, pr = url.pr_number, "fetching PR metadata from GitHub API");
        let metadata = self
            .get(&base_url, token, JSON_MEDIA_TYPE)
            .await?
            .json::<PullResponse>()
            .await?;

        debug!("fetching PR diff from GitHub API");
        let diff_text = self.get(&base_url, token, DIFF_MEDIA_TYPE).await?.text().await?;
        debug!(diff_bytes = diff_text.len(), "received PR diff");

        let files = self
            .get(&format!("{base_url}/files?per_page=100"), token, JSON_MEDIA_TYPE)
            .await?
            .json::<Vec<FileEntry>>()
            .await?
            .into_iter()
            .map(|f| PrFile {
                path: f.filename,
                status: f.status,
            })
            .collect::<Vec<_>>();
        debug!(files = files.len(), "received PR file list");

        Ok(PrFacts {
            title: metadata.title.unwrap_or_default(),
            author: metadata.user.map(|u| u.login).unwrap_or_default(),
            diff_text,
            files,
        })
    }
}
