use std::fmt;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::config::GovernanceConfig;
use crate::utils::labels::{is_exclude_label, semver_class, SemverClass};
use crate::utils::pr_info::PullRequest;
use crate::utils::review_event::TimelineEvent;

const EXCLUDED_TITLE_PREFIXES: [&str; 4] = ["build", "ci", "test", "spec"];

static BACKPORT_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)backport").expect("valid backport regex"));

/// Why a PR is exempt from the minimum-open window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateExclusion {
    TitlePrefix(String),
    ExclusionLabel(String),
    BackportTitle,
    ExcludedAuthor(String),
    Merged,
}

impl fmt::Display for GateExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateExclusion::TitlePrefix(prefix) => write!(f, "title prefix {:?}", prefix),
            GateExclusion::ExclusionLabel(label) => write!(f, "label {:?}", label),
            GateExclusion::BackportTitle => write!(f, "backport title"),
            GateExclusion::ExcludedAuthor(author) => write!(f, "author {}", author),
            GateExclusion::Merged => write!(f, "already merged"),
        }
    }
}

pub fn title_prefix(title: &str) -> Option<String> {
    title
        .split_once(':')
        .map(|(prefix, _)| prefix.trim().to_ascii_lowercase())
}

pub fn gate_exclusion(config: &GovernanceConfig, pr: &PullRequest) -> Option<GateExclusion> {
    if let Some(prefix) = title_prefix(pr.title()) {
        if EXCLUDED_TITLE_PREFIXES.contains(&prefix.as_str()) {
            return Some(GateExclusion::TitlePrefix(prefix));
        }
    }
    if let Some(label) = pr.labels().iter().find(|l| is_exclude_label(l)) {
        return Some(GateExclusion::ExclusionLabel(label.clone()));
    }
    if BACKPORT_TITLE.is_match(pr.title()) {
        return Some(GateExclusion::BackportTitle);
    }
    if config.is_excluded_author(pr.author()) {
        return Some(GateExclusion::ExcludedAuthor(pr.author().clone()));
    }
    if pr.merged() {
        return Some(GateExclusion::Merged);
    }
    None
}

/// Unlabeled PRs get the longest window so the gate never closes early.
pub fn minimum_open_time(config: &GovernanceConfig, pr: &PullRequest) -> Duration {
    match semver_class(pr.labels()) {
        Some(SemverClass::Major) | None => config.minimum_major_open_time(),
        Some(SemverClass::Minor) => config.minimum_minor_open_time(),
        Some(SemverClass::Patch) | Some(SemverClass::None) => config.minimum_patch_open_time(),
    }
}

/// The latest draft -> ready transition, or the creation time if there never was one.
pub fn effective_opened_at(pr: &PullRequest, timeline: &[TimelineEvent]) -> DateTime<Utc> {
    timeline
        .iter()
        .filter(|event| event.is_ready_for_review())
        .filter_map(|event| event.created_at())
        .max()
        .unwrap_or_else(|| pr.created_at())
}

pub fn is_within_gate(
    config: &GovernanceConfig,
    pr: &PullRequest,
    timeline: &[TimelineEvent],
    now: DateTime<Utc>,
) -> bool {
    if pr.draft() {
        return true;
    }
    now - effective_opened_at(pr, timeline) < minimum_open_time(config, pr)
}

pub fn should_have_new_pr_label(
    config: &GovernanceConfig,
    pr: &PullRequest,
    timeline: &[TimelineEvent],
    now: DateTime<Utc>,
) -> bool {
    if let Some(exclusion) = gate_exclusion(config, pr) {
        log::debug!("[should_have_new_pr_label] {} is excluded: {}", pr, exclusion);
        return false;
    }
    is_within_gate(config, pr, timeline, now)
}

pub fn pr_ready_date(config: &GovernanceConfig, pr: &PullRequest, timeline: &[TimelineEvent]) -> DateTime<Utc> {
    effective_opened_at(pr, timeline) + minimum_open_time(config, pr)
}

pub fn format_ready_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
