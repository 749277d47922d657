use crate::core::check_sync::{reset_check, upsert_check};
use crate::core::context::GovernanceContext;
use crate::core::label_sync::{present_in_group, transition_group};
use crate::github::api::{GithubError, InstallationApi};
use crate::utils::check_run::{CheckConclusion, CheckRunPayload, DEPRECATION_REVIEW_CHECK_NAME};
use crate::utils::config::GovernanceConfig;
use crate::utils::labels::{
    DEPRECATION_REVIEW_COMPLETE_LABEL, DEPRECATION_REVIEW_LABELS, DEPRECATION_REVIEW_REQUESTED_LABEL,
};
use crate::utils::pr_info::PullRequest;

pub const CHECKLIST_HEADER: &str = "## 🪦 Deprecation Checklist";
const CHECKLIST_BODY: &str = include_str!("deprecation-checklist.md");
const UNCHECKED_ITEM: &str = "- [ ] ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeprecationState {
    None,
    Requested,
    Complete,
}

impl DeprecationState {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            DeprecationState::None => None,
            DeprecationState::Requested => Some(DEPRECATION_REVIEW_REQUESTED_LABEL),
            DeprecationState::Complete => Some(DEPRECATION_REVIEW_COMPLETE_LABEL),
        }
    }
}

pub fn current_state(pr: &PullRequest) -> DeprecationState {
    if pr.has_label(DEPRECATION_REVIEW_COMPLETE_LABEL) {
        DeprecationState::Complete
    } else if pr.has_label(DEPRECATION_REVIEW_REQUESTED_LABEL) {
        DeprecationState::Requested
    } else {
        DeprecationState::None
    }
}

/// Only the checklist the bot itself posted is authoritative.
pub fn is_checklist_comment(config: &GovernanceConfig, author: &str, body: &str) -> bool {
    config.is_bot(author) && body.starts_with(CHECKLIST_HEADER)
}

pub fn is_checklist_complete(body: &str) -> bool {
    !body.contains(UNCHECKED_ITEM)
}

fn check_payload(state: DeprecationState) -> CheckRunPayload {
    match state {
        DeprecationState::None => CheckRunPayload::completed(
            DEPRECATION_REVIEW_CHECK_NAME,
            CheckConclusion::Neutral,
            "Outdated",
            &format!("PR no longer requires {}", DEPRECATION_REVIEW_CHECK_NAME),
        ),
        DeprecationState::Requested => {
            CheckRunPayload::in_progress(DEPRECATION_REVIEW_CHECK_NAME, "Pending", "Review in-progress")
        }
        DeprecationState::Complete => CheckRunPayload::completed(
            DEPRECATION_REVIEW_CHECK_NAME,
            CheckConclusion::Success,
            "Complete",
            "All review items have been checked off",
        ),
    }
}

pub async fn evaluate_deprecation_review(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
) -> Result<DeprecationState, GithubError> {
    let mut state = current_state(pr);
    if present_in_group(pr, &DEPRECATION_REVIEW_LABELS).len() > 1 {
        log::warn!("[evaluate_deprecation_review] {} carries both deprecation-review labels", pr);
        transition_group(client, pr, &DEPRECATION_REVIEW_LABELS, state.label()).await?;
    }

    if state == DeprecationState::Requested {
        let comments = client.list_issue_comments(pr.repo(), pr.number()).await?;
        let checklist = comments
            .iter()
            .find(|c| is_checklist_comment(ctx.config(), c.author(), c.body()));
        match checklist {
            None => {
                log::info!("[evaluate_deprecation_review] Posting deprecation checklist on {}", pr);
                client.create_issue_comment(pr.repo(), pr.number(), CHECKLIST_BODY).await?;
            }
            Some(comment) if is_checklist_complete(comment.body()) => {
                log::info!("[evaluate_deprecation_review] Checklist on {} is complete", pr);
                transition_group(client, pr, &DEPRECATION_REVIEW_LABELS, Some(DEPRECATION_REVIEW_COMPLETE_LABEL))
                    .await?;
                state = DeprecationState::Complete;
            }
            Some(_) => {}
        }
    }

    let payload = check_payload(state);
    if state == DeprecationState::None {
        reset_check(client, pr, &payload).await?;
    } else {
        upsert_check(client, pr, &payload).await?;
    }
    Ok(state)
}
