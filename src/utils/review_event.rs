use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

/// A review or issue comment authored on a PR. Comments carry no formal state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReviewEvent {
    author: String,
    body: String,
    state: Option<ReviewState>,
    submitted_at: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(author: &str, body: &str, state: Option<ReviewState>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            author: author.to_string(),
            body: body.to_string(),
            state,
            submitted_at,
        }
    }

    pub fn author(&self) -> &String {
        &self.author
    }

    pub fn body(&self) -> &String {
        &self.body
    }

    pub fn state(&self) -> Option<ReviewState> {
        self.state
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimelineEvent {
    event: String,
    created_at: Option<DateTime<Utc>>,
}

impl TimelineEvent {
    pub fn new(event: &str, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            event: event.to_string(),
            created_at,
        }
    }

    pub fn event(&self) -> &String {
        &self.event
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_ready_for_review(&self) -> bool {
        self.event == "ready_for_review"
    }
}
