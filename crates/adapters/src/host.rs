// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull request host client.
//!
//! The worker and scheduler only speak the [`PrHost`] trait; the GitHub
//! REST implementation lives behind it so tests run against fakes and a
//! different host (or a GitHub Enterprise base URL) is a constructor away.

use async_trait::async_trait;
use lv_core::PullRequestRef;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("PR host transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("PR host rejected the token")]
    Auth,
    #[error("PR host rate limit exceeded")]
    RateLimited,
    #[error("a pull request for this head already exists")]
    Conflict,
    #[error("repository URL not understood: {0}")]
    BadRepoUrl(String),
    #[error("PR host API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl HostError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, HostError::Transport(_) | HostError::RateLimited)
    }
}

/// Request to open a pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePr {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait PrHost: Send + Sync {
    /// Open PRs whose head branch starts with `branch_prefix` followed by
    /// a separator (fingerprint counting for the PR cap).
    async fn list_open_prs(
        &self,
        repo_url: &str,
        branch_prefix: &str,
    ) -> Result<Vec<PullRequestRef>, HostError>;

    /// Open a PR. `Conflict` means one already exists for this head; the
    /// caller reuses it via [`PrHost::find_open_pr`].
    async fn create_pr(&self, repo_url: &str, req: &CreatePr)
        -> Result<PullRequestRef, HostError>;

    /// The open PR with exactly this head branch, if any.
    async fn find_open_pr(
        &self,
        repo_url: &str,
        head_branch: &str,
    ) -> Result<Option<PullRequestRef>, HostError>;

    /// Refresh title/body after the writeback commit.
    async fn update_pr(&self, repo_url: &str, number: u64, body: &str) -> Result<(), HostError>;
}

/// `owner/repo` parsed out of an HTTPS remote URL.
fn parse_slug(repo_url: &str) -> Result<String, HostError> {
    let trimmed = repo_url.trim_end_matches('/').trim_end_matches(".git");
    let mut segments = trimmed.rsplit('/');
    let repo = segments.next().filter(|s| !s.is_empty());
    let owner = segments.next().filter(|s| !s.is_empty() && !s.contains(':'));
    match (owner, repo) {
        (Some(owner), Some(repo)) => Ok(format!("{owner}/{repo}")),
        _ => Err(HostError::BadRepoUrl(repo_url.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct ApiPr {
    number: u64,
    html_url: String,
    head: ApiRef,
    base: ApiRef,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    branch: String,
    sha: String,
}

impl ApiPr {
    fn into_ref(self) -> PullRequestRef {
        PullRequestRef {
            number: self.number,
            url: self.html_url,
            branch_name: self.head.branch,
            base_branch: self.base.branch,
            head_commit: self.head.sha,
        }
    }
}

/// GitHub REST v3 implementation.
pub struct GitHubHost {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GitHubHost {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn url(&self, slug: &str, tail: &str) -> String {
        format!("{}/repos/{slug}{tail}", self.api_base.trim_end_matches('/'))
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 {
            return Err(HostError::Auth);
        }
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("1");
        if status.as_u16() == 429 || (status.as_u16() == 403 && remaining == "0") {
            return Err(HostError::RateLimited);
        }
        let message = response.text().await.unwrap_or_default();
        if status.as_u16() == 422 && message.contains("already exists") {
            return Err(HostError::Conflict);
        }
        Err(HostError::Api { status: status.as_u16(), message })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("user-agent", "leviathan")
    }
}

#[async_trait]
impl PrHost for GitHubHost {
    async fn list_open_prs(
        &self,
        repo_url: &str,
        branch_prefix: &str,
    ) -> Result<Vec<PullRequestRef>, HostError> {
        let slug = parse_slug(repo_url)?;
        let url = self.url(&slug, "/pulls?state=open&per_page=100");
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let prs: Vec<ApiPr> = self.check(response).await?.json().await?;
        let wanted = format!("{branch_prefix}/");
        Ok(prs
            .into_iter()
            .map(ApiPr::into_ref)
            .filter(|pr| pr.branch_name.starts_with(&wanted))
            .collect())
    }

    async fn create_pr(
        &self,
        repo_url: &str,
        req: &CreatePr,
    ) -> Result<PullRequestRef, HostError> {
        let slug = parse_slug(repo_url)?;
        let url = self.url(&slug, "/pulls");
        let body = serde_json::json!({
            "title": req.title,
            "body": req.body,
            "head": req.head_branch,
            "base": req.base_branch,
        });
        let response = self.request(reqwest::Method::POST, url).json(&body).send().await?;
        let pr: ApiPr = self.check(response).await?.json().await?;
        Ok(pr.into_ref())
    }

    async fn find_open_pr(
        &self,
        repo_url: &str,
        head_branch: &str,
    ) -> Result<Option<PullRequestRef>, HostError> {
        let slug = parse_slug(repo_url)?;
        let owner = slug.split('/').next().unwrap_or_default().to_string();
        let url =
            self.url(&slug, &format!("/pulls?state=open&head={owner}:{head_branch}"));
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let prs: Vec<ApiPr> = self.check(response).await?.json().await?;
        Ok(prs.into_iter().map(ApiPr::into_ref).find(|pr| pr.branch_name == head_branch))
    }

    async fn update_pr(&self, repo_url: &str, number: u64, body: &str) -> Result<(), HostError> {
        let slug = parse_slug(repo_url)?;
        let url = self.url(&slug, &format!("/pulls/{number}"));
        let payload = serde_json::json!({ "body": body });
        let response = self.request(reqwest::Method::PATCH, url).json(&payload).send().await?;
        self.check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
