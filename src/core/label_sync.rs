use crate::github::api::{GithubError, InstallationApi, RemoveOutcome};
use crate::utils::pr_info::PullRequest;

/// Adds `label` unless the PR already carries it. Returns whether a write happened.
pub async fn ensure_label(
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
    label: &str,
) -> Result<bool, GithubError> {
    if pr.has_label(label) {
        return Ok(false);
    }
    client.add_labels(pr.repo(), pr.number(), &[label.to_string()]).await?;
    let mut labels = pr.labels().clone();
    labels.push(label.to_string());
    pr.set_labels(labels);
    Ok(true)
}

/// Removes `label` if the PR carries it. A concurrent removal is not an error.
pub async fn drop_label(
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
    label: &str,
) -> Result<bool, GithubError> {
    if !pr.has_label(label) {
        return Ok(false);
    }
    let outcome = client.remove_label(pr.repo(), pr.number(), label).await?;
    if outcome == RemoveOutcome::NotFound {
        log::debug!("[drop_label] {} was already gone from {}", label, pr);
    }
    let labels = pr.labels().iter().filter(|l| *l != label).cloned().collect();
    pr.set_labels(labels);
    Ok(outcome == RemoveOutcome::Removed)
}

/// Moves a mutually exclusive label group to `target`, or empties it when
/// `target` is `None`. The target is added before the others are removed so
/// the group is never transiently empty.
pub async fn transition_group(
    client: &dyn InstallationApi,
    pr: &mut PullRequest,
    group: &[&str],
    target: Option<&str>,
) -> Result<bool, GithubError> {
    let mut changed = false;
    if let Some(target) = target {
        changed |= ensure_label(client, pr, target).await?;
    }
    for label in group {
        if Some(*label) == target {
            continue;
        }
        changed |= drop_label(client, pr, label).await?;
    }
    Ok(changed)
}

/// Labels from `group` currently on the PR, in group order.
pub fn present_in_group<'a>(pr: &PullRequest, group: &[&'a str]) -> Vec<&'a str> {
    group.iter().copied().filter(|label| pr.has_label(label)).collect()
}
