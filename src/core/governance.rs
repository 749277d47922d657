use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::api_review::{evaluate_api_review, ApiReviewState};
use crate::core::context::GovernanceContext;
use crate::core::deprecation_review::{evaluate_deprecation_review, DeprecationState};
use crate::core::label_sync::{drop_label, ensure_label};
use crate::core::semver::enforce_semver_label;
use crate::core::time_gate::should_have_new_pr_label;
use crate::github::api::{GithubError, InstallationApi};
use crate::utils::labels::NEW_PR_LABEL;
use crate::utils::pr_info::PullRequest;
use crate::utils::review_event::TimelineEvent;
use crate::utils::webhook_event::EventError;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error(transparent)]
    Event(#[from] EventError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    pub api_review: ApiReviewState,
    pub deprecation_review: DeprecationState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceOutcome {
    pub new_pr: bool,
    pub tracks: TrackOutcome,
}

/// Webhook payloads can be stale by the time they are processed, so labels
/// are always re-read before deciding anything.
async fn refreshed(client: &dyn InstallationApi, pr: &PullRequest) -> Result<PullRequest, GithubError> {
    let mut pr = pr.clone();
    pr.set_labels(client.list_labels(pr.repo(), pr.number()).await?);
    Ok(pr)
}

async fn run_tracks(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
    timeline: &[TimelineEvent],
) -> Result<TrackOutcome, GithubError> {
    let api_review = evaluate_api_review(ctx, client, pr, timeline).await?;
    let deprecation_review = evaluate_deprecation_review(ctx, client, pr).await?;
    Ok(TrackOutcome {
        api_review,
        deprecation_review,
    })
}

/// Full path shared by the dispatcher and the reconciliation sweep: time gate,
/// both review tracks and the semver check. Merged PRs are never touched.
pub async fn evaluate_pull_request(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    pr: &PullRequest,
    now: DateTime<Utc>,
) -> Result<Option<GovernanceOutcome>, GithubError> {
    if pr.merged() {
        log::debug!("[evaluate_pull_request] {} is merged, nothing to do", pr);
        return Ok(None);
    }
    let mut pr = refreshed(client, pr).await?;
    let timeline = client.list_timeline_events(pr.repo(), pr.number()).await?;

    let new_pr = should_have_new_pr_label(ctx.config(), &pr, &timeline, now);
    if new_pr {
        if ensure_label(client, &mut pr, NEW_PR_LABEL).await? {
            log::info!("[evaluate_pull_request] {} is still within its minimum open time", pr);
        }
    } else if drop_label(client, &mut pr, NEW_PR_LABEL).await? {
        log::info!("[evaluate_pull_request] {} left its minimum open time, re-evaluating review tracks", pr);
    }

    let tracks = run_tracks(ctx, client, &mut pr, &timeline).await?;
    enforce_semver_label(client, &pr).await?;
    Ok(Some(GovernanceOutcome { new_pr, tracks }))
}

/// Review-track path for review and comment events; the gate is unaffected by them.
pub async fn evaluate_review_tracks(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    pr: &PullRequest,
) -> Result<Option<TrackOutcome>, GithubError> {
    if pr.merged() {
        log::debug!("[evaluate_review_tracks] {} is merged, nothing to do", pr);
        return Ok(None);
    }
    let mut pr = refreshed(client, pr).await?;
    let timeline = client.list_timeline_events(pr.repo(), pr.number()).await?;
    run_tracks(ctx, client, &mut pr, &timeline).await.map(Some)
}
