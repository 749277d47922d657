use crate::core::approval::{aggregate, classify, ApprovalTally, ReviewDecision, Vote};
use crate::core::check_sync::{reset_check, upsert_check};
use crate::core::context::GovernanceContext;
use crate::core::label_sync::{present_in_group, transition_group};
use crate::core::time_gate::{format_ready_date, pr_ready_date};
use crate::github::api::{GithubError, InstallationApi};
use crate::utils::check_run::{CheckConclusion, CheckRunPayload, API_REVIEW_CHECK_NAME};
use crate::utils::config::{GovernanceConfig, APPROVAL_THRESHOLD};
use crate::utils::labels::{
    is_exclude_label, is_semver_major_minor_label, API_REVIEW_APPROVED_LABEL, API_REVIEW_DECLINED_LABEL,
    API_REVIEW_LABELS, API_REVIEW_REQUESTED_LABEL,
};
use crate::utils::pr_info::PullRequest;
use crate::utils::review_event::{ReviewEvent, TimelineEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiReviewState {
    None,
    Requested,
    Approved,
    Declined,
}

impl ApiReviewState {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            ApiReviewState::None => None,
            ApiReviewState::Requested => Some(API_REVIEW_REQUESTED_LABEL),
            ApiReviewState::Approved => Some(API_REVIEW_APPROVED_LABEL),
            ApiReviewState::Declined => Some(API_REVIEW_DECLINED_LABEL),
        }
    }
}

/// State read from the PR labels. Duplicates resolve declined > approved > requested.
pub fn current_state(pr: &PullRequest) -> ApiReviewState {
    if pr.has_label(API_REVIEW_DECLINED_LABEL) {
        ApiReviewState::Declined
    } else if pr.has_label(API_REVIEW_APPROVED_LABEL) {
        ApiReviewState::Approved
    } else if pr.has_label(API_REVIEW_REQUESTED_LABEL) {
        ApiReviewState::Requested
    } else {
        ApiReviewState::None
    }
}

pub fn is_api_review_required(config: &GovernanceConfig, pr: &PullRequest) -> bool {
    let risky = pr.labels().iter().any(|l| is_semver_major_minor_label(l));
    let excluded = pr.labels().iter().any(|l| is_exclude_label(l));
    let branch_ok = !config.default_branch_only() || pr.targets_default_branch();
    risky && !excluded && branch_ok && !pr.draft() && !pr.merged()
}

fn outdated_payload() -> CheckRunPayload {
    CheckRunPayload::completed(
        API_REVIEW_CHECK_NAME,
        CheckConclusion::Neutral,
        "Outdated",
        &format!("PR no longer requires {}", API_REVIEW_CHECK_NAME),
    )
}

fn render_summary(tally: &ApprovalTally) -> String {
    let sections = [
        ("Approved", tally.approved_logins()),
        ("Requested Changes", tally.requested_changes_logins()),
        ("Declined", tally.declined_logins()),
    ];
    let mut summary = String::new();
    for (heading, logins) in sections.iter() {
        if logins.is_empty() {
            continue;
        }
        summary.push_str(&format!("#### {}\n\n", heading));
        for login in logins {
            summary.push_str(&format!("* @{}\n", login));
        }
        summary.push('\n');
    }
    if summary.is_empty() {
        return "No API Working Group reviews yet.".to_string();
    }
    summary.trim_end().to_string()
}

pub fn check_payload(state: ApiReviewState, tally: &ApprovalTally, ready_on: &str) -> CheckRunPayload {
    let summary = render_summary(tally);
    match state {
        ApiReviewState::None => outdated_payload(),
        ApiReviewState::Requested => {
            let title = format!(
                "Pending ({}/{} LGTMs - ready on {})",
                tally.approved().len(),
                APPROVAL_THRESHOLD,
                ready_on
            );
            CheckRunPayload::in_progress(API_REVIEW_CHECK_NAME, &title, &summary)
        }
        ApiReviewState::Approved => {
            CheckRunPayload::completed(API_REVIEW_CHECK_NAME, CheckConclusion::Success, "Approved", &summary)
        }
        ApiReviewState::Declined => {
            CheckRunPayload::completed(API_REVIEW_CHECK_NAME, CheckConclusion::Failure, "Declined", &summary)
        }
    }
}

/// The PR author cannot approve their own API change.
fn without_self_approvals(author: &str, events: Vec<ReviewEvent>) -> Vec<ReviewEvent> {
    events
        .into_iter()
        .filter(|event| !(event.author().eq_ignore_ascii_case(author) && classify(event) == Some(Vote::Approve)))
        .collect()
}

pub async fn fetch_tally(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    pr: &PullRequest,
) -> Result<ApprovalTally, GithubError> {
    let config = ctx.config();
    let org = config.api_wg_org(pr.repo().owner());
    let roster = ctx.rosters().members(client, org, config.api_wg_team()).await?;
    let reviews = client.list_reviews(pr.repo(), pr.number()).await?;
    let comments = client.list_issue_comments(pr.repo(), pr.number()).await?;
    let reviews = without_self_approvals(pr.author(), reviews);
    let comments = without_self_approvals(pr.author(), comments);
    Ok(aggregate(&roster, &reviews, &comments))
}

/// Drives the API review label group and its check run to the state implied
/// by the PR's labels and its WG reviews.
pub async fn evaluate_api_review(
    ctx: &GovernanceContext,
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
    timeline: &[TimelineEvent],
) -> Result<ApiReviewState, GithubError> {
    let mut state = current_state(pr);
    if present_in_group(pr, &API_REVIEW_LABELS).len() > 1 {
        log::warn!("[evaluate_api_review] {} carries several api-review labels, keeping {:?}", pr, state);
        transition_group(client, pr, &API_REVIEW_LABELS, state.label()).await?;
    }

    let required = is_api_review_required(ctx.config(), pr);
    match (state, required) {
        (ApiReviewState::None, true) => {
            log::info!("[evaluate_api_review] {} requires API review", pr);
            transition_group(client, pr, &API_REVIEW_LABELS, Some(API_REVIEW_REQUESTED_LABEL)).await?;
            state = ApiReviewState::Requested;
        }
        (ApiReviewState::Requested, false) => {
            log::info!("[evaluate_api_review] {} no longer requires API review", pr);
            transition_group(client, pr, &API_REVIEW_LABELS, None).await?;
            reset_check(client, pr, &outdated_payload()).await?;
            return Ok(ApiReviewState::None);
        }
        (ApiReviewState::None, false) => {
            reset_check(client, pr, &outdated_payload()).await?;
            return Ok(ApiReviewState::None);
        }
        _ => {}
    }

    let tally = fetch_tally(ctx, client, pr).await?;
    if state == ApiReviewState::Requested {
        let next = match tally.decision() {
            ReviewDecision::Approved => ApiReviewState::Approved,
            ReviewDecision::Declined => ApiReviewState::Declined,
            ReviewDecision::Requested => ApiReviewState::Requested,
        };
        if next != state {
            log::info!("[evaluate_api_review] {} API review {:?} -> {:?}", pr, state, next);
            transition_group(client, pr, &API_REVIEW_LABELS, next.label()).await?;
            state = next;
        }
    }

    let ready_on = format_ready_date(pr_ready_date(ctx.config(), pr, timeline));
    upsert_check(client, pr, &check_payload(state, &tally, &ready_on)).await?;
    Ok(state)
}
