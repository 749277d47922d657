use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::utils::pr_info::{PullRequest, RepoRef};

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unsupported event {event_name}.{action}")]
    Unsupported { event_name: String, action: String },
    #[error("malformed {event_name} payload: {source}")]
    Malformed {
        event_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{event_name}.{action} for {pr} arrived without a label")]
    MissingLabel { event_name: String, action: String, pr: String },
}

/// Envelope handed over by the webhook transport.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_name: String,
    pub payload: Value,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Edited,
    Synchronize,
    ReadyForReview,
    ConvertedToDraft,
    Labeled,
    Unlabeled,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Submitted,
    Edited,
    Dismissed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub pull_request: PullRequest,
    /// Present exactly for `labeled` / `unlabeled`.
    pub label: Option<String>,
    pub sender: String,
    pub installation_id: u64,
}

#[derive(Debug, Clone)]
pub struct PullRequestReviewEvent {
    pub action: ReviewAction,
    pub pull_request: PullRequest,
    pub installation_id: u64,
}

#[derive(Debug, Clone)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub repo: RepoRef,
    pub number: u64,
    pub labels: Vec<String>,
    pub comment_author: String,
    pub comment_body: String,
    pub installation_id: u64,
}

#[derive(Debug, Clone)]
pub enum WebhookEvent {
    PullRequest(PullRequestEvent),
    PullRequestReview(PullRequestReviewEvent),
    IssueComment(IssueCommentEvent),
}

impl WebhookEvent {
    pub fn installation_id(&self) -> u64 {
        match self {
            WebhookEvent::PullRequest(e) => e.installation_id,
            WebhookEvent::PullRequestReview(e) => e.installation_id,
            WebhookEvent::IssueComment(e) => e.installation_id,
        }
    }
}

#[derive(Deserialize)]
struct RawLogin {
    login: String,
}

#[derive(Deserialize)]
struct RawName {
    name: String,
}

#[derive(Deserialize)]
struct RawInstallation {
    id: u64,
}

#[derive(Deserialize)]
struct RawPullRequestEvent {
    action: PullRequestAction,
    pull_request: PullRequest,
    label: Option<RawName>,
    sender: RawLogin,
    installation: RawInstallation,
}

#[derive(Deserialize)]
struct RawReviewEvent {
    action: ReviewAction,
    pull_request: PullRequest,
    installation: RawInstallation,
}

#[derive(Deserialize)]
struct RawIssue {
    number: u64,
    #[serde(default)]
    labels: Vec<RawName>,
    pull_request: Option<Value>,
}

#[derive(Deserialize)]
struct RawComment {
    user: RawLogin,
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
struct RawRepository {
    name: String,
    owner: RawLogin,
}

#[derive(Deserialize)]
struct RawIssueCommentEvent {
    action: CommentAction,
    issue: RawIssue,
    comment: RawComment,
    repository: RawRepository,
    installation: RawInstallation,
}

fn raw_action(payload: &Value) -> String {
    payload["action"].as_str().unwrap_or_default().to_string()
}

fn decode<T: for<'de> Deserialize<'de>>(event_name: &str, payload: Value) -> Result<T, EventError> {
    serde_json::from_value(payload).map_err(|source| EventError::Malformed {
        event_name: event_name.to_string(),
        source,
    })
}

/// Turns a transport envelope into a typed event, rejecting anything this
/// service does not act on.
pub fn parse_event(envelope: EventEnvelope) -> Result<WebhookEvent, EventError> {
    let event_name = envelope.event_name;
    let action = raw_action(&envelope.payload);
    let unsupported = |event_name: &str, action: &str| EventError::Unsupported {
        event_name: event_name.to_string(),
        action: action.to_string(),
    };
    match event_name.as_str() {
        "pull_request" => {
            let raw: RawPullRequestEvent = decode(&event_name, envelope.payload)?;
            if raw.action == PullRequestAction::Other {
                return Err(unsupported(&event_name, &action));
            }
            let needs_label = matches!(raw.action, PullRequestAction::Labeled | PullRequestAction::Unlabeled);
            if needs_label && raw.label.is_none() {
                return Err(EventError::MissingLabel {
                    event_name: event_name.clone(),
                    action,
                    pr: raw.pull_request.to_string(),
                });
            }
            Ok(WebhookEvent::PullRequest(PullRequestEvent {
                action: raw.action,
                pull_request: raw.pull_request,
                label: raw.label.map(|l| l.name),
                sender: raw.sender.login,
                installation_id: raw.installation.id,
            }))
        }
        "pull_request_review" => {
            let raw: RawReviewEvent = decode(&event_name, envelope.payload)?;
            if raw.action == ReviewAction::Other {
                return Err(unsupported(&event_name, &action));
            }
            Ok(WebhookEvent::PullRequestReview(PullRequestReviewEvent {
                action: raw.action,
                pull_request: raw.pull_request,
                installation_id: raw.installation.id,
            }))
        }
        "issue_comment" => {
            let raw: RawIssueCommentEvent = decode(&event_name, envelope.payload)?;
            if raw.action == CommentAction::Other || raw.issue.pull_request.is_none() {
                return Err(unsupported(&event_name, &action));
            }
            Ok(WebhookEvent::IssueComment(IssueCommentEvent {
                action: raw.action,
                repo: RepoRef::new(&raw.repository.owner.login, &raw.repository.name),
                number: raw.issue.number,
                labels: raw.issue.labels.into_iter().map(|l| l.name).collect(),
                comment_author: raw.comment.user.login,
                comment_body: raw.comment.body,
                installation_id: raw.installation.id,
            }))
        }
        _ => Err(unsupported(&event_name, &action)),
    }
}
