pub const NEW_PR_LABEL: &str = "new-pr 🌱";

pub const SEMVER_PREFIX: &str = "semver/";
pub const SEMVER_PATCH_LABEL: &str = "semver/patch";
pub const SEMVER_MINOR_LABEL: &str = "semver/minor";
pub const SEMVER_MAJOR_LABEL: &str = "semver/major";
pub const SEMVER_NONE_LABEL: &str = "semver/none";
pub const SEMVER_LABELS: [&str; 4] = [
    SEMVER_MAJOR_LABEL,
    SEMVER_MINOR_LABEL,
    SEMVER_PATCH_LABEL,
    SEMVER_NONE_LABEL,
];

pub const API_REVIEW_REQUESTED_LABEL: &str = "api-review/requested 🗳";
pub const API_REVIEW_APPROVED_LABEL: &str = "api-review/approved ✅";
pub const API_REVIEW_DECLINED_LABEL: &str = "api-review/declined ❌";
pub const API_REVIEW_LABELS: [&str; 3] = [
    API_REVIEW_REQUESTED_LABEL,
    API_REVIEW_APPROVED_LABEL,
    API_REVIEW_DECLINED_LABEL,
];

pub const DEPRECATION_REVIEW_REQUESTED_LABEL: &str = "deprecation-review/requested 📝";
pub const DEPRECATION_REVIEW_COMPLETE_LABEL: &str = "deprecation-review/complete ✅";
pub const DEPRECATION_REVIEW_LABELS: [&str; 2] = [
    DEPRECATION_REVIEW_REQUESTED_LABEL,
    DEPRECATION_REVIEW_COMPLETE_LABEL,
];

pub const BACKPORT_LABEL: &str = "backport";
pub const BACKPORT_SKIP_LABEL: &str = "backport-check-skip";
pub const FAST_TRACK_LABEL: &str = "fast-track 🚅";
pub const EXCLUDE_LABELS: [&str; 3] = [BACKPORT_LABEL, BACKPORT_SKIP_LABEL, FAST_TRACK_LABEL];

pub const DOCUMENTATION_LABEL: &str = "documentation :notebook:";

/// Semver risk classes, ordered from least to most risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SemverClass {
    None,
    Patch,
    Minor,
    Major,
}

impl SemverClass {
    pub fn label(&self) -> &'static str {
        match self {
            SemverClass::None => SEMVER_NONE_LABEL,
            SemverClass::Patch => SEMVER_PATCH_LABEL,
            SemverClass::Minor => SEMVER_MINOR_LABEL,
            SemverClass::Major => SEMVER_MAJOR_LABEL,
        }
    }
}

/// Resolves the semver class of a label set with major > minor > patch/none
/// precedence. Returns `None` when no semver label is present at all.
pub fn semver_class<S: AsRef<str>>(labels: &[S]) -> Option<SemverClass> {
    let has = |name: &str| labels.iter().any(|l| l.as_ref() == name);
    if has(SEMVER_MAJOR_LABEL) {
        return Some(SemverClass::Major);
    }
    if has(SEMVER_MINOR_LABEL) {
        return Some(SemverClass::Minor);
    }
    if has(SEMVER_PATCH_LABEL) {
        return Some(SemverClass::Patch);
    }
    if has(SEMVER_NONE_LABEL) {
        return Some(SemverClass::None);
    }
    None
}

pub fn is_semver_label(name: &str) -> bool {
    SEMVER_LABELS.contains(&name)
}

pub fn is_semver_major_minor_label(name: &str) -> bool {
    name == SEMVER_MAJOR_LABEL || name == SEMVER_MINOR_LABEL
}

pub fn is_api_review_label(name: &str) -> bool {
    API_REVIEW_LABELS.contains(&name)
}

pub fn is_deprecation_review_label(name: &str) -> bool {
    DEPRECATION_REVIEW_LABELS.contains(&name)
}

pub fn is_exclude_label(name: &str) -> bool {
    EXCLUDE_LABELS.contains(&name)
}

/// Cheap filter for label events: only these labels can change a governance decision.
pub fn is_governance_relevant(name: &str) -> bool {
    name == NEW_PR_LABEL
        || is_semver_label(name)
        || is_exclude_label(name)
        || is_api_review_label(name)
        || is_deprecation_review_label(name)
}
