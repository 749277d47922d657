use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::github::api::{AppApi, GithubError, InstallationApi};
use crate::utils::config::GovernanceConfig;

/// Team rosters keyed by (org, team slug). Entries expire after one
/// reconciliation interval.
pub struct RosterCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, String), (Instant, Vec<String>)>>,
}

impl RosterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &(String, String)) -> Option<Vec<String>> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .get(key)
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, members)| members.clone())
    }

    pub async fn members(
        &self,
        client: &dyn InstallationApi,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<String>, GithubError> {
        let key = (org.to_string(), team_slug.to_string());
        if let Some(members) = self.cached(&key) {
            return Ok(members);
        }
        let members = client.list_team_members(org, team_slug).await?;
        log::debug!("[RosterCache::members] {}/{} has {} members", org, team_slug, members.len());
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key, (Instant::now(), members.clone()));
        Ok(members)
    }
}

/// Process-wide state built once in `main` and shared with the dispatcher and
/// the reconciliation loop.
pub struct GovernanceContext {
    config: GovernanceConfig,
    app: Arc<dyn AppApi>,
    rosters: RosterCache,
}

impl GovernanceContext {
    pub fn new(config: GovernanceConfig, app: Arc<dyn AppApi>) -> Self {
        let rosters = RosterCache::new(config.reconcile_interval());
        Self { config, app, rosters }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn app(&self) -> &Arc<dyn AppApi> {
        &self.app
    }

    pub fn rosters(&self) -> &RosterCache {
        &self.rosters
    }
}
