use async_trait::async_trait;

use super::api::{GithubError, InstallationApi, RemoveOutcome};
use super::config::GithubConnection;
use super::{checks, labels, prs, repos, reviews, teams};
use crate::utils::check_run::{CheckRun, CheckRunPayload};
use crate::utils::pr_info::{PullRequest, RepoRef};
use crate::utils::review_event::{ReviewEvent, TimelineEvent};

/// REST implementation of [`InstallationApi`] bound to one installation token.
pub struct GithubInstallation {
    conn: GithubConnection,
}

impl GithubInstallation {
    pub fn new(conn: GithubConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl InstallationApi for GithubInstallation {
    async fn list_repos(&self) -> Result<Vec<RepoRef>, GithubError> {
        repos::get_github_app_installed_repos(&self.conn).await
    }

    async fn list_open_prs(&self, repo: &RepoRef, page: u32) -> Result<Vec<PullRequest>, GithubError> {
        prs::list_open_prs(&self.conn, repo, page).await
    }

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, GithubError> {
        prs::get_pull_request(&self.conn, repo, number).await
    }

    async fn list_labels(&self, repo: &RepoRef, number: u64) -> Result<Vec<String>, GithubError> {
        labels::list_labels(&self.conn, repo, number).await
    }

    async fn add_labels(&self, repo: &RepoRef, number: u64, names: &[String]) -> Result<(), GithubError> {
        labels::add_labels(&self.conn, repo, number, names).await
    }

    async fn remove_label(&self, repo: &RepoRef, number: u64, label: &str) -> Result<RemoveOutcome, GithubError> {
        labels::remove_label(&self.conn, repo, number, label).await
    }

    async fn list_check_runs_for_ref(&self, repo: &RepoRef, sha: &str) -> Result<Vec<CheckRun>, GithubError> {
        checks::list_check_runs_for_ref(&self.conn, repo, sha).await
    }

    async fn create_check_run(&self, repo: &RepoRef, sha: &str, payload: &CheckRunPayload) -> Result<(), GithubError> {
        checks::create_check_run(&self.conn, repo, sha, payload).await
    }

    async fn update_check_run(
        &self,
        repo: &RepoRef,
        check_run_id: u64,
        payload: &CheckRunPayload,
    ) -> Result<(), GithubError> {
        checks::update_check_run(&self.conn, repo, check_run_id, payload).await
    }

    async fn list_reviews(&self, repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError> {
        reviews::list_reviews(&self.conn, repo, number).await
    }

    async fn list_issue_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<ReviewEvent>, GithubError> {
        reviews::list_issue_comments(&self.conn, repo, number).await
    }

    async fn create_issue_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<(), GithubError> {
        reviews::create_issue_comment(&self.conn, repo, number, body).await
    }

    async fn list_timeline_events(&self, repo: &RepoRef, number: u64) -> Result<Vec<TimelineEvent>, GithubError> {
        reviews::list_timeline_events(&self.conn, repo, number).await
    }

    async fn list_team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>, GithubError> {
        teams::list_team_members(&self.conn, org, team_slug).await
    }
}
