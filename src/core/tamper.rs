use crate::core::api_review::is_api_review_required;
use crate::core::label_sync::{drop_label, ensure_label};
use crate::github::api::{GithubError, InstallationApi};
use crate::utils::config::GovernanceConfig;
use crate::utils::labels::{
    API_REVIEW_APPROVED_LABEL, API_REVIEW_DECLINED_LABEL, API_REVIEW_REQUESTED_LABEL,
    DEPRECATION_REVIEW_COMPLETE_LABEL,
};
use crate::utils::pr_info::PullRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    Added(String),
    Removed(String),
}

/// The compensating mutation for a change a human was not allowed to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TamperVerdict {
    Allowed,
    Remove(String),
    Restore(String),
}

fn is_bot_only_label(label: &str) -> bool {
    label == API_REVIEW_APPROVED_LABEL || label == API_REVIEW_DECLINED_LABEL || label == DEPRECATION_REVIEW_COMPLETE_LABEL
}

/// Judges a label change against the review-track rules. `pr` reflects the
/// labels after the change. Merged PRs may be relabeled freely.
pub fn judge(config: &GovernanceConfig, pr: &PullRequest, change: &LabelChange, sender: &str) -> TamperVerdict {
    if config.is_bot(sender) || pr.merged() {
        return TamperVerdict::Allowed;
    }
    match change {
        LabelChange::Added(label) if is_bot_only_label(label) => TamperVerdict::Remove(label.clone()),
        LabelChange::Removed(label) if is_bot_only_label(label) => TamperVerdict::Restore(label.clone()),
        LabelChange::Added(label) if label == API_REVIEW_REQUESTED_LABEL && !is_api_review_required(config, pr) => {
            TamperVerdict::Remove(label.clone())
        }
        LabelChange::Removed(label) if label == API_REVIEW_REQUESTED_LABEL && is_api_review_required(config, pr) => {
            TamperVerdict::Restore(label.clone())
        }
        _ => TamperVerdict::Allowed,
    }
}

/// Reverts a disallowed review-track label change. Returns whether a
/// compensating mutation was issued.
pub async fn guard_review_labels(
    config: &GovernanceConfig,
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
    change: &LabelChange,
    sender: &str,
) -> Result<bool, GithubError> {
    match judge(config, pr, change, sender) {
        TamperVerdict::Allowed => Ok(false),
        TamperVerdict::Remove(label) => {
            log::warn!("[guard_review_labels] {} tried to add {} to {} - this is not permitted", sender, label, pr);
            drop_label(client, pr, &label).await?;
            Ok(true)
        }
        TamperVerdict::Restore(label) => {
            log::warn!("[guard_review_labels] {} tried to remove {} from {} - this is not permitted", sender, label, pr);
            ensure_label(client, pr, &label).await?;
            Ok(true)
        }
    }
}
