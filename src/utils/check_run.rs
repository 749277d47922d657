use serde::{Deserialize, Serialize};

pub const API_REVIEW_CHECK_NAME: &str = "API Review";
pub const DEPRECATION_REVIEW_CHECK_NAME: &str = "Deprecation Review";
pub const SEMVER_CHECK_NAME: &str = "Semver Label Enforcement";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Neutral,
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CheckRun {
    id: u64,
    name: String,
    status: CheckStatus,
    conclusion: Option<CheckConclusion>,
    title: Option<String>,
    summary: Option<String>,
}

impl CheckRun {
    pub fn new(
        id: u64,
        name: &str,
        status: CheckStatus,
        conclusion: Option<CheckConclusion>,
        title: Option<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            status,
            conclusion,
            title,
            summary,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn conclusion(&self) -> Option<CheckConclusion> {
        self.conclusion
    }

    pub fn title(&self) -> Option<&String> {
        self.title.as_ref()
    }

    pub fn summary(&self) -> Option<&String> {
        self.summary.as_ref()
    }

    /// True when writing `payload` to this run would not change anything visible.
    pub fn matches(&self, payload: &CheckRunPayload) -> bool {
        self.name == payload.name
            && self.status == payload.status
            && self.conclusion == payload.conclusion
            && self.title.as_deref() == Some(payload.title.as_str())
            && self.summary.as_deref() == Some(payload.summary.as_str())
    }
}

/// Desired state of a check run, written by create or update.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CheckRunPayload {
    name: String,
    status: CheckStatus,
    conclusion: Option<CheckConclusion>,
    title: String,
    summary: String,
}

impl CheckRunPayload {
    pub fn new(
        name: &str,
        status: CheckStatus,
        conclusion: Option<CheckConclusion>,
        title: &str,
        summary: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            status,
            conclusion,
            title: title.to_string(),
            summary: summary.to_string(),
        }
    }

    pub fn in_progress(name: &str, title: &str, summary: &str) -> Self {
        Self::new(name, CheckStatus::InProgress, None, title, summary)
    }

    pub fn completed(name: &str, conclusion: CheckConclusion, title: &str, summary: &str) -> Self {
        Self::new(name, CheckStatus::Completed, Some(conclusion), title, summary)
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn conclusion(&self) -> Option<CheckConclusion> {
        self.conclusion
    }

    pub fn title(&self) -> &String {
        &self.title
    }

    pub fn summary(&self) -> &String {
        &self.summary
    }
}
