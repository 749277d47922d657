use crate::core::check_sync::{upsert_check, CheckWrite};
use crate::core::label_sync::ensure_label;
use crate::core::time_gate::title_prefix;
use crate::github::api::{GithubError, InstallationApi};
use crate::utils::check_run::{CheckConclusion, CheckRunPayload, SEMVER_CHECK_NAME};
use crate::utils::labels::{
    is_semver_label, DOCUMENTATION_LABEL, SEMVER_NONE_LABEL, SEMVER_PATCH_LABEL, SEMVER_PREFIX,
};
use crate::utils::pr_info::PullRequest;

pub fn semver_check_payload(pr: &PullRequest) -> CheckRunPayload {
    let found: Vec<&String> = pr.labels().iter().filter(|l| is_semver_label(l)).collect();
    match found.as_slice() {
        [] => CheckRunPayload::in_progress(
            SEMVER_CHECK_NAME,
            "No semver/* label found",
            "We couldn't find a semver/* label, please add one",
        ),
        [label] => CheckRunPayload::completed(
            SEMVER_CHECK_NAME,
            CheckConclusion::Success,
            &format!("Found \"{}\"", label),
            "Found a single semver/* label, looking good here.",
        ),
        _ => CheckRunPayload::in_progress(
            SEMVER_CHECK_NAME,
            "Multiple semver/* labels found",
            "We found multiple semver/* labels, please remove one",
        ),
    }
}

pub async fn enforce_semver_label(client: &dyn InstallationApi, pr: &PullRequest) -> Result<CheckWrite, GithubError> {
    let payload = semver_check_payload(pr);
    log::debug!("[enforce_semver_label] {} -> {}", pr, payload.title());
    upsert_check(client, pr, &payload).await
}

/// Labels implied by a conventional title prefix. Existing semver labels and
/// non-default base branches are respected.
pub fn triage_labels(pr: &PullRequest) -> Vec<&'static str> {
    if !pr.targets_default_branch() || pr.labels().iter().any(|l| l.starts_with(SEMVER_PREFIX)) {
        return vec![];
    }
    match title_prefix(pr.title()).as_deref() {
        Some("docs") => vec![SEMVER_PATCH_LABEL, DOCUMENTATION_LABEL],
        Some("ci") | Some("test") | Some("build") => vec![SEMVER_NONE_LABEL],
        _ => vec![],
    }
}

pub async fn apply_triage_labels(client: &dyn InstallationApi, pr: &mut PullRequest) -> Result<bool, GithubError> {
    let mut changed = false;
    for label in triage_labels(pr) {
        log::info!("[apply_triage_labels] Adding {} to {}", label, pr);
        changed |= ensure_label(client, pr, label).await?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::FakeGithub;
    use crate::utils::check_run::CheckStatus;
    use crate::utils::labels::{SEMVER_MAJOR_LABEL, SEMVER_MINOR_LABEL};
    use crate::utils::pr_info::tests::test_pr;
    use chrono::Utc;

    #[test]
    fn test_semver_check_payloads() {
        let pr = test_pr(1, "feat: x", &[], Utc::now());
        assert_eq!(semver_check_payload(&pr).title(), "No semver/* label found");
        assert_eq!(semver_check_payload(&pr).status(), CheckStatus::InProgress);

        let pr = test_pr(1, "feat: x", &[SEMVER_MINOR_LABEL, SEMVER_MAJOR_LABEL], Utc::now());
        assert_eq!(semver_check_payload(&pr).title(), "Multiple semver/* labels found");

        let pr = test_pr(1, "feat: x", &["bug", SEMVER_MINOR_LABEL], Utc::now());
        let payload = semver_check_payload(&pr);
        assert_eq!(payload.title(), "Found \"semver/minor\"");
        assert_eq!(payload.conclusion(), Some(CheckConclusion::Success));
    }

    #[test]
    fn test_triage_labels() {
        let pr = test_pr(1, "docs: fix typo", &[], Utc::now());
        assert_eq!(triage_labels(&pr), vec![SEMVER_PATCH_LABEL, DOCUMENTATION_LABEL]);
        let pr = test_pr(1, "build: bump gn", &[], Utc::now());
        assert_eq!(triage_labels(&pr), vec![SEMVER_NONE_LABEL]);
        let pr = test_pr(1, "docs: fix typo", &[SEMVER_MINOR_LABEL], Utc::now());
        assert!(triage_labels(&pr).is_empty());
        let pr = test_pr(1, "feat: new api", &[], Utc::now());
        assert!(triage_labels(&pr).is_empty());
    }

    #[tokio::test]
    async fn test_enforcement_updates_in_place() {
        let github = FakeGithub::new("gate-bot[bot]");
        let mut pr = test_pr(1, "feat: x", &[], Utc::now());
        assert_eq!(enforce_semver_label(&github, &pr).await.expect("check"), CheckWrite::Created);
        pr.set_labels(vec![SEMVER_MINOR_LABEL.to_string()]);
        assert_eq!(enforce_semver_label(&github, &pr).await.expect("check"), CheckWrite::Updated);
        assert_eq!(enforce_semver_label(&github, &pr).await.expect("check"), CheckWrite::Unchanged);
        assert_eq!(github.check_runs("sha1").len(), 1);
    }

    #[tokio::test]
    async fn test_apply_triage_labels() {
        let github = FakeGithub::new("gate-bot[bot]");
        let mut pr = test_pr(1, "ci: cache deps", &[], Utc::now());
        github.add_pr(pr.clone());
        assert!(apply_triage_labels(&github, &mut pr).await.expect("triage"));
        assert_eq!(github.labels(1), vec![SEMVER_NONE_LABEL.to_string()]);
        assert!(!apply_triage_labels(&github, &mut pr).await.expect("triage"));
    }
}
