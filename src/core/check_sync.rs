use crate::github::api::{GithubError, InstallationApi};
use crate::utils::check_run::CheckRunPayload;
use crate::utils::pr_info::PullRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckWrite {
    Created,
    Updated,
    Unchanged,
    /// Fork PRs cannot receive check runs.
    Skipped,
}

/// Writes `payload` to the check run of the same name on the PR head,
/// creating it when none exists and leaving it alone when it already matches.
pub async fn upsert_check(
    client: &dyn InstallationApi,
    pr: &PullRequest,
    payload: &CheckRunPayload,
) -> Result<CheckWrite, GithubError> {
    write_check(client, pr, payload, true).await
}

/// Like [`upsert_check`] but never creates a run. Used to mark a run outdated.
pub async fn reset_check(
    client: &dyn InstallationApi,
    pr: &PullRequest,
    payload: &CheckRunPayload,
) -> Result<CheckWrite, GithubError> {
    write_check(client, pr, payload, false).await
}

async fn write_check(
    client: &dyn InstallationApi,
    pr: &PullRequest,
    payload: &CheckRunPayload,
    create_missing: bool,
) -> Result<CheckWrite, GithubError> {
    if pr.head_repo_fork() {
        log::debug!("[write_check] {} is a fork, skipping {}", pr, payload.name());
        return Ok(CheckWrite::Skipped);
    }
    let runs = client.list_check_runs_for_ref(pr.repo(), pr.head_sha()).await?;
    match runs.iter().find(|run| run.name() == payload.name()) {
        Some(run) if run.matches(payload) => Ok(CheckWrite::Unchanged),
        Some(run) => {
            client.update_check_run(pr.repo(), run.id(), payload).await?;
            Ok(CheckWrite::Updated)
        }
        None if create_missing => {
            client.create_check_run(pr.repo(), pr.head_sha(), payload).await?;
            Ok(CheckWrite::Created)
        }
        None => Ok(CheckWrite::Unchanged),
    }
}
