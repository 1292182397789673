pub mod diff;
pub mod types;

pub use types::{ChangedFile, RepoRef};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{Environment, GitHubConfig, ReviewConfig};

const USER_AGENT: &str = "pr-reviewer";
const FILES_PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    ApiStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid repository name: {0} (expected owner/repo)")]
    InvalidRepo(String),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),
}

/// Operations the reviewer performs against the pull request.
///
/// Every posting call is a visible side effect on the PR. Callers decide
/// whether a failure aborts the run or is logged and skipped.
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    /// Head commit SHA, read once when the client connects to the pull request.
    fn head_sha(&self) -> &str;

    /// Changed files whose name matches the reviewable extension allow-list.
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, PrError>;

    /// Post a comment on the pull request conversation.
    async fn post_comment(&self, body: &str) -> Result<(), PrError>;

    /// Post a review comment anchored to `line` of `path` at `commit_id`.
    async fn post_line_comment(
        &self,
        path: &str,
        commit_id: &str,
        line: u32,
        body: &str,
    ) -> Result<(), PrError>;
}

/// Parse `REPO_FULL_NAME` ("owner/repo") into its parts.
pub fn parse_repo_full_name(full_name: &str) -> Result<RepoRef, PrError> {
    let invalid = || PrError::InvalidRepo(full_name.to_string());
    let (owner, repo) = full_name.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// `PullRequestClient` backed by the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repo: RepoRef,
    pr_number: u64,
    head_sha: String,
    review: ReviewConfig,
}

#[derive(Deserialize)]
struct PullResponse {
    head: HeadRef,
}

#[derive(Deserialize)]
struct HeadRef {
    sha: String,
}

#[derive(Serialize)]
struct IssueCommentCreate<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct ReviewCommentCreate<'a> {
    body: &'a str,
    commit_id: &'a str,
    path: &'a str,
    line: u32,
    side: &'a str,
}

impl GitHubClient {
    /// Open the pull request and capture its head commit.
    ///
    /// Fails if the token is rejected or the repository / PR cannot be read.
    #[instrument(skip_all, fields(repo = %env.repo, pr = env.pr_number))]
    pub async fn connect(
        github: &GitHubConfig,
        review: &ReviewConfig,
        env: &Environment,
    ) -> Result<GitHubClient, PrError> {
        let mut client = GitHubClient {
            http: reqwest::Client::new(),
            api_url: github.api_url.trim_end_matches('/').to_string(),
            token: env.github_token.clone(),
            repo: env.repo.clone(),
            pr_number: env.pr_number,
            head_sha: String::new(),
            review: review.clone(),
        };

        debug!("fetching pull request metadata");
        let pull: PullResponse = client
            .get(&client.pull_url(""))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(head_sha = %pull.head.sha, "resolved head commit");

        client.head_sha = pull.head.sha;
        Ok(client)
    }

    fn pull_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}{}",
            self.api_url, self.repo.owner, self.repo.repo, self.pr_number, suffix
        )
    }

    fn issue_comments_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.repo.owner, self.repo.repo, self.pr_number
        )
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorized(self.http.get(url))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorized(self.http.post(url))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(&self.token)
    }

    async fn send_checked(builder: reqwest::RequestBuilder) -> Result<(), PrError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrError::ApiStatus { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl PullRequestClient for GitHubClient {
    fn head_sha(&self) -> &str {
        &self.head_sha
    }

    #[instrument(skip(self), fields(repo = %self.repo, pr = self.pr_number))]
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, PrError> {
        let url = self.pull_url("/files");
        let mut files = Vec::new();
        let mut page = 1usize;

        loop {
            let batch: Vec<ChangedFile> = self
                .get(&url)
                .query(&[("per_page", FILES_PER_PAGE), ("page", page)])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            let fetched = batch.len();
            debug!(page, fetched, "received changed files page");

            files.extend(
                batch
                    .into_iter()
                    .filter(|f| self.review.is_reviewable(&f.filename)),
            );

            if fetched < FILES_PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(reviewable = files.len(), "filtered changed files");
        Ok(files)
    }

    #[instrument(skip(self, body), fields(pr = self.pr_number))]
    async fn post_comment(&self, body: &str) -> Result<(), PrError> {
        let request = self
            .post(&self.issue_comments_url())
            .json(&IssueCommentCreate { body });
        Self::send_checked(request).await
    }

    #[instrument(skip(self, body), fields(pr = self.pr_number))]
    async fn post_line_comment(
        &self,
        path: &str,
        commit_id: &str,
        line: u32,
        body: &str,
    ) -> Result<(), PrError> {
        let request = self.post(&self.pull_url("/comments")).json(&ReviewCommentCreate {
            body,
            commit_id,
            path,
            line,
            side: "RIGHT",
        });
        Self::send_checked(request).await
    }
}
