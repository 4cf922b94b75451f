use std::fmt;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::repository::Repository;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

// ─── Check runs ───

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunStatus {
    Queued,
    InProgress,
    Completed,
}

/// Terminal result of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Success,
    Failure,
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conclusion::Success => write!(f, "success"),
            Conclusion::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: CheckRunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
}

/// Partial update of a check run. Absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCheckRun {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CheckRunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<Conclusion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A check run as returned by GitHub.
///
/// `status` and `conclusion` are kept as GitHub's raw strings: the platform
/// reports values this crate never posts (`waiting`, `requested`, `neutral`,
/// `cancelled`, `skipped`, `stale`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCheckRun {
    pub id: u64,
    #[serde(default)]
    pub head_sha: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

// ─── Commit statuses ───

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusState::Pending => write!(f, "pending"),
            StatusState::Success => write!(f, "success"),
            StatusState::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateStatus {
    pub state: StatusState,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

/// One immutable status record on a commit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCommitStatus {
    pub id: u64,
    pub state: StatusState,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ─── Transport seams ───

#[async_trait]
pub trait ChecksApi: Send + Sync {
    async fn create_check_run(
        &self,
        repo: &Repository,
        request: &CreateCheckRun,
    ) -> Result<RemoteCheckRun>;

    async fn update_check_run(
        &self,
        repo: &Repository,
        id: u64,
        request: &UpdateCheckRun,
    ) -> Result<RemoteCheckRun>;
}

/// GitHub's commit-status API only appends; there is no update verb.
#[async_trait]
pub trait StatusesApi: Send + Sync {
    async fn create_status(
        &self,
        repo: &Repository,
        sha: &str,
        request: &CreateStatus,
    ) -> Result<RemoteCommitStatus>;
}

// ─── Client ───

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    api_base: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("scorecard-status")
                .build()
                .expect("failed to build HTTP client"),
            token,
            api_base: GITHUB_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root, e.g. a GitHub Enterprise server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    #[instrument(skip(self, body))]
    async fn api_send<B, T>(&self, method: Method, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let token = self
            .token
            .as_ref()
            .context("GitHub token is required for the checks and statuses API")?;

        let response = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));
            match message {
                Some(message) => bail!("{url} returned HTTP {status}: {message}"),
                None => bail!("{url} returned HTTP {status}"),
            }
        }

        debug!(%status, "request complete");

        response
            .json()
            .await
            .with_context(|| format!("failed to parse JSON from {url}"))
    }
}

#[async_trait]
impl ChecksApi for GitHubClient {
    #[instrument(skip(self, request), fields(repo = %repo, head_sha = %request.head_sha))]
    async fn create_check_run(
        &self,
        repo: &Repository,
        request: &CreateCheckRun,
    ) -> Result<RemoteCheckRun> {
        let url = format!(
            "{}/repos/{}/{}/check-runs",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        self.api_send(Method::POST, &url, request).await
    }

    #[instrument(skip(self, request), fields(repo = %repo))]
    async fn update_check_run(
        &self,
        repo: &Repository,
        id: u64,
        request: &UpdateCheckRun,
    ) -> Result<RemoteCheckRun> {
        let url = format!(
            "{}/repos/{}/{}/check-runs/{id}",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        self.api_send(Method::PATCH, &url, request).await
    }
}

#[async_trait]
impl StatusesApi for GitHubClient {
    #[instrument(skip(self, request), fields(repo = %repo, state = %request.state))]
    async fn create_status(
        &self,
        repo: &Repository,
        sha: &str,
        request: &CreateStatus,
    ) -> Result<RemoteCommitStatus> {
        let url = format!(
            "{}/repos/{}/{}/statuses/{sha}",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        self.api_send(Method::POST, &url, request).await
    }
}
