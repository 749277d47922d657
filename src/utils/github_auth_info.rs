use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde::Serialize;

/// Installation access token as returned by `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GithubAuthInfo {
    token: String,
    expires_at: DateTime<Utc>,
}

impl GithubAuthInfo {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn token(&self) -> &String {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Tokens are refreshed a minute early so an in-flight sweep never holds a dead one.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::minutes(1) > now
    }
}
