use chrono::{DateTime, Utc};

use crate::core::approval::has_review_marker;
use crate::core::context::GovernanceContext;
use crate::core::deprecation_review::is_checklist_comment;
use crate::core::governance::{evaluate_pull_request, evaluate_review_tracks, GovernanceError};
use crate::core::semver::apply_triage_labels;
use crate::core::tamper::{guard_review_labels, LabelChange};
use crate::github::api::InstallationApi;
use crate::utils::labels::is_governance_relevant;
use crate::utils::webhook_event::{
    parse_event, CommentAction, EventEnvelope, EventError, IssueCommentEvent, PullRequestAction, PullRequestEvent,
    PullRequestReviewEvent, ReviewAction, WebhookEvent,
};

/// Entry point for the webhook transport. Returns once every resulting
/// mutation has been attempted.
pub async fn handle_event(ctx: &GovernanceContext, envelope: EventEnvelope) -> Result<(), GovernanceError> {
    let event = parse_event(envelope)?;
    let client = ctx.app().installation(event.installation_id()).await?;
    dispatch(ctx, client.as_ref(), event, Utc::now()).await
}

pub async fn dispatch(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    event: WebhookEvent,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    match event {
        WebhookEvent::PullRequest(event) => on_pull_request(ctx, client, event, now).await,
        WebhookEvent::PullRequestReview(event) => on_review(ctx, client, event).await,
        WebhookEvent::IssueComment(event) => on_issue_comment(ctx, client, event).await,
    }
}

async fn on_pull_request(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    event: PullRequestEvent,
    now: DateTime<Utc>,
) -> Result<(), GovernanceError> {
    let mut pr = event.pull_request;
    log::info!("[on_pull_request] {:?} on {} by {}", event.action, pr, event.sender);
    match event.action {
        PullRequestAction::Opened | PullRequestAction::Edited | PullRequestAction::Reopened => {
            if event.action != PullRequestAction::Reopened && !pr.merged() {
                apply_triage_labels(client, &mut pr).await?;
            }
            evaluate_pull_request(ctx, client, &pr, now).await?;
        }
        PullRequestAction::Synchronize | PullRequestAction::ReadyForReview | PullRequestAction::ConvertedToDraft => {
            evaluate_pull_request(ctx, client, &pr, now).await?;
        }
        PullRequestAction::Labeled | PullRequestAction::Unlabeled => {
            let label = event.label.ok_or_else(|| EventError::MissingLabel {
                event_name: "pull_request".to_string(),
                action: format!("{:?}", event.action),
                pr: pr.to_string(),
            })?;
            if !is_governance_relevant(&label) {
                log::debug!("[on_pull_request] {} is not a governance label, ignoring", label);
                return Ok(());
            }
            let change = if event.action == PullRequestAction::Labeled {
                LabelChange::Added(label)
            } else {
                LabelChange::Removed(label)
            };
            guard_review_labels(ctx.config(), client, &mut pr, &change, &event.sender).await?;
            evaluate_pull_request(ctx, client, &pr, now).await?;
        }
        PullRequestAction::Other => {
            log::debug!("[on_pull_request] Ignoring unsupported action on {}", pr);
        }
    }
    Ok(())
}

async fn on_review(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    event: PullRequestReviewEvent,
) -> Result<(), GovernanceError> {
    if event.action == ReviewAction::Other {
        return Ok(());
    }
    log::info!("[on_review] Review {:?} on {}", event.action, event.pull_request);
    evaluate_review_tracks(ctx, client, &event.pull_request).await?;
    Ok(())
}

async fn on_issue_comment(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    event: IssueCommentEvent,
) -> Result<(), GovernanceError> {
    if event.action == CommentAction::Other {
        return Ok(());
    }
    let is_vote = has_review_marker(&event.comment_body);
    let is_checklist = is_checklist_comment(ctx.config(), &event.comment_author, &event.comment_body);
    if !is_vote && !is_checklist {
        log::debug!("[on_issue_comment] Comment on {}#{} carries no governance marker", event.repo, event.number);
        return Ok(());
    }
    let pr = client.get_pull_request(&event.repo, event.number).await?;
    log::info!("[on_issue_comment] Governance comment {:?} on {}", event.action, pr);
    evaluate_review_tracks(ctx, client, &pr).await?;
    Ok(())
}
