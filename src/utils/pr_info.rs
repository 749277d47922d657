use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub fn owner(&self) -> &String {
        &self.owner
    }

    pub fn name(&self) -> &String {
        &self.name
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Snapshot of a pull request as read from the hosting system.
#[derive(Debug, Serialize, Clone)]
pub struct PullRequest {
    repo: RepoRef,
    number: u64,
    title: String,
    author: String,
    head_sha: String,
    head_repo_fork: bool,
    base_ref: String,
    default_branch: String,
    created_at: DateTime<Utc>,
    labels: Vec<String>,
    merged: bool,
    draft: bool,
}

impl PullRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: RepoRef,
        number: u64,
        title: String,
        author: String,
        head_sha: String,
        head_repo_fork: bool,
        base_ref: String,
        default_branch: String,
        created_at: DateTime<Utc>,
        labels: Vec<String>,
        merged: bool,
        draft: bool,
    ) -> Self {
        Self {
            repo,
            number,
            title,
            author,
            head_sha,
            head_repo_fork,
            base_ref,
            default_branch,
            created_at,
            labels,
            merged,
            draft,
        }
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn title(&self) -> &String {
        &self.title
    }

    pub fn author(&self) -> &String {
        &self.author
    }

    pub fn head_sha(&self) -> &String {
        &self.head_sha
    }

    pub fn head_repo_fork(&self) -> bool {
        self.head_repo_fork
    }

    pub fn base_ref(&self) -> &String {
        &self.base_ref
    }

    pub fn default_branch(&self) -> &String {
        &self.default_branch
    }

    pub fn targets_default_branch(&self) -> bool {
        self.base_ref == self.default_branch
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn labels(&self) -> &Vec<String> {
        &self.labels
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }

    pub fn merged(&self) -> bool {
        self.merged
    }

    pub fn draft(&self) -> bool {
        self.draft
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    pub fn set_draft(&mut self, draft: bool) {
        self.draft = draft;
    }

    pub fn set_merged(&mut self, merged: bool) {
        self.merged = merged;
    }
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

#[derive(Deserialize)]
struct RawLogin {
    login: String,
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize)]
struct RawHeadRepo {
    #[serde(default)]
    fork: bool,
}

#[derive(Deserialize)]
struct RawHead {
    sha: String,
    repo: Option<RawHeadRepo>,
}

#[derive(Deserialize)]
struct RawBaseRepo {
    name: String,
    owner: RawLogin,
    default_branch: String,
}

#[derive(Deserialize)]
struct RawBase {
    #[serde(rename = "ref")]
    ref_name: String,
    repo: RawBaseRepo,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    title: String,
    user: RawLogin,
    head: RawHead,
    base: RawBase,
    created_at: DateTime<Utc>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    draft: bool,
}

impl<'de> Deserialize<'de> for PullRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: RawPullRequest = Deserialize::deserialize(deserializer)?;
        // List endpoints omit `merged`; `merged_at` is always present.
        let merged = raw.merged.unwrap_or(false) || raw.merged_at.is_some();
        // A deleted head repository can only have been a fork.
        let head_repo_fork = raw.head.repo.map(|r| r.fork).unwrap_or(true);
        Ok(PullRequest {
            repo: RepoRef::new(&raw.base.repo.owner.login, &raw.base.repo.name),
            number: raw.number,
            title: raw.title,
            author: raw.user.login,
            head_sha: raw.head.sha,
            head_repo_fork,
            base_ref: raw.base.ref_name,
            default_branch: raw.base.repo.default_branch,
            created_at: raw.created_at,
            labels: raw.labels.into_iter().map(|l| l.name).collect(),
            merged,
            draft: raw.draft,
        })
    }
}
