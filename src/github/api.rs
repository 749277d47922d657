use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::utils::check_run::{CheckRun, CheckRunPayload};
use crate::utils::pr_info::{PullRequest, RepoRef};
use crate::utils::review_event::{ReviewEvent, TimelineEvent};

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("unable to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl GithubError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GithubError::Status { status: 404, .. })
    }
}

/// Outcome of removing a label; an absent label is a normal branch, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// App-level operations, authenticated as the GitHub App itself.
#[async_trait]
pub trait AppApi: Send + Sync {
    async fn list_installations(&self) -> Result<Vec<u64>, GithubError>;

    async fn installation(&self, installation_id: u64) -> Result<Arc<dyn InstallationApi>, GithubError>;
}

/// Operations performed on behalf of a single installation.
#[async_trait]
pub trait InstallationApi: Send + Sync {
    async fn list_repos(&self) -> Result<Vec<RepoRef>, GithubError>;

    /// One page of open PRs, 1-based. An empty page means the listing is exhausted.
    async fn list_open_prs(&self, repo: &RepoRef, page: u32) -> Result<Vec<PullRequest>, GithubError>;

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, GithubError>;

    async fn list_labels(&self, repo: &RepoRef, number: u64) -> Result<Vec<String>, GithubError>;

    async fn add_labels(&self, repo: &RepoRef, number: u64, labels: &[String]) -> Result<(), GithubError>;

    async fn remove_label(&self, repo: &RepoRef, number: u64, label: &str) -> Result<RemoveOutcome, GithubError>;

    async fn list_check_runs_for_ref(&self, repo: &RepoRef, sha: &str) -> Result<Vec<CheckRun>, GithubError>;

    async fn create_check_run(&self, repo: &RepoRef, sha: &str, payload: &CheckRunPayload) -> Result<(), GithubError>;

    async fn update_check_run(
        &self,
        repo: &RepoRef,
        check_run_id: u64,
        payload: &CheckRunPayload,
    ) -> Result<(), GithubError>;

    async fn list_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError>;

    async fn list_issue_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError>;

    async fn create_issue_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<(), GithubError>;

    async fn list_timeline_events(&self, repo: &RepoRef, number: u64) -> Result<Vec<TimelineEvent>, GithubError>;

    async fn list_team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>, GithubError>;
}
