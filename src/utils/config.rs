use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

/// Approvals needed from distinct WG members before API review is approved.
pub const APPROVAL_THRESHOLD: usize = 2;

const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";
const DEFAULT_PRIVATE_KEY_PATH: &str = "/app/private-key.pem";
const DEFAULT_API_WG_TEAM: &str = "wg-api";
const DEFAULT_LOG_DIR: &str = "/tmp/logs";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: String, value: String },
    #[error("minimum open times must satisfy patch <= minor <= major")]
    UnorderedWindows,
}

#[derive(Debug, Clone)]
pub struct GovernanceConfig {
    github_base_url: String,
    github_app_id: String,
    private_key_path: String,
    bot_login: String,
    excluded_authors: Vec<String>,
    minimum_patch_open_time: Duration,
    minimum_minor_open_time: Duration,
    minimum_major_open_time: Duration,
    api_wg_org: Option<String>,
    api_wg_team: String,
    default_branch_only: bool,
    reconcile_interval: StdDuration,
    log_dir: String,
    log_level: String,
}

impl GovernanceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| get(name).ok_or_else(|| ConfigError::Missing(name.to_string()));
        let hours = |name: &str, default: i64| -> Result<Duration, ConfigError> {
            match get(name) {
                None => Ok(Duration::hours(default)),
                Some(v) => v
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|h| *h >= 0)
                    .map(Duration::hours)
                    .ok_or(ConfigError::Invalid { name: name.to_string(), value: v }),
            }
        };

        let default_branch_only = match get("DEFAULT_BRANCH_ONLY") {
            None => true,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid { name: "DEFAULT_BRANCH_ONLY".to_string(), value: v });
                }
            },
        };
        let reconcile_interval = match get("RECONCILE_INTERVAL_SECS") {
            None => StdDuration::from_secs(300),
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .map(StdDuration::from_secs)
                .ok_or(ConfigError::Invalid { name: "RECONCILE_INTERVAL_SECS".to_string(), value: v })?,
        };
        let excluded_authors = get("EXCLUDED_AUTHORS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            github_base_url: get("GITHUB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            github_app_id: required("GITHUB_APP_ID")?,
            private_key_path: get("GITHUB_PRIVATE_KEY_PATH").unwrap_or_else(|| DEFAULT_PRIVATE_KEY_PATH.to_string()),
            bot_login: required("BOT_USER_NAME")?,
            excluded_authors,
            minimum_patch_open_time: hours("MINIMUM_PATCH_OPEN_HOURS", 24)?,
            minimum_minor_open_time: hours("MINIMUM_MINOR_OPEN_HOURS", 24 * 7)?,
            minimum_major_open_time: hours("MINIMUM_MAJOR_OPEN_HOURS", 24 * 7)?,
            api_wg_org: get("API_WG_ORG"),
            api_wg_team: get("API_WG_TEAM").unwrap_or_else(|| DEFAULT_API_WG_TEAM.to_string()),
            default_branch_only,
            reconcile_interval,
            log_dir: get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };
        if config.minimum_patch_open_time > config.minimum_minor_open_time
            || config.minimum_minor_open_time > config.minimum_major_open_time
        {
            return Err(ConfigError::UnorderedWindows);
        }
        Ok(config)
    }

    pub fn github_base_url(&self) -> &String {
        &self.github_base_url
    }

    pub fn github_app_id(&self) -> &String {
        &self.github_app_id
    }

    pub fn private_key_path(&self) -> &String {
        &self.private_key_path
    }

    pub fn bot_login(&self) -> &String {
        &self.bot_login
    }

    pub fn is_bot(&self, login: &str) -> bool {
        self.bot_login == login
    }

    /// Authors whose PRs skip the time gate: the bot itself plus configured automation.
    pub fn is_excluded_author(&self, login: &str) -> bool {
        self.is_bot(login) || self.excluded_authors.iter().any(|a| a == login)
    }

    pub fn minimum_patch_open_time(&self) -> Duration {
        self.minimum_patch_open_time
    }

    pub fn minimum_minor_open_time(&self) -> Duration {
        self.minimum_minor_open_time
    }

    pub fn minimum_major_open_time(&self) -> Duration {
        self.minimum_major_open_time
    }

    /// Org owning the API WG team; falls back to the repository owner.
    pub fn api_wg_org<'a>(&'a self, repo_owner: &'a str) -> &'a str {
        self.api_wg_org.as_deref().unwrap_or(repo_owner)
    }

    pub fn api_wg_team(&self) -> &String {
        &self.api_wg_team
    }

    pub fn default_branch_only(&self) -> bool {
        self.default_branch_only
    }

    pub fn reconcile_interval(&self) -> StdDuration {
        self.reconcile_interval
    }

    pub fn log_dir(&self) -> &String {
        &self.log_dir
    }

    pub fn log_level(&self) -> &String {
        &self.log_level
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    pub fn test_config() -> GovernanceConfig {
        config_with(&[])
    }

    pub fn config_with(overrides: &[(&str, &str)]) -> GovernanceConfig {
        try_config_with(overrides).expect("valid test config")
    }

    fn try_config_with(overrides: &[(&str, &str)]) -> Result<GovernanceConfig, ConfigError> {
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("GITHUB_APP_ID".to_string(), "1234".to_string());
        vars.insert("BOT_USER_NAME".to_string(), "gate-bot[bot]".to_string());
        vars.insert("EXCLUDED_AUTHORS".to_string(), "roller-bot[bot], electron-bot".to_string());
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }
        GovernanceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = test_config();
        assert_eq!(config.github_base_url(), "https://api.github.com");
        assert_eq!(config.minimum_patch_open_time(), Duration::hours(24));
        assert_eq!(config.minimum_minor_open_time(), Duration::days(7));
        assert_eq!(config.minimum_major_open_time(), Duration::days(7));
        assert_eq!(config.api_wg_team(), "wg-api");
        assert_eq!(config.api_wg_org("electron"), "electron");
        assert!(config.default_branch_only());
        assert_eq!(config.reconcile_interval(), StdDuration::from_secs(300));
        assert!(config.is_excluded_author("electron-bot"));
        assert!(config.is_excluded_author("gate-bot[bot]"));
        assert!(!config.is_excluded_author("contributor"));
    }

    #[test]
    fn test_missing_required_values() {
        let res = GovernanceConfig::from_lookup(|_| None);
        assert_eq!(res.err(), Some(ConfigError::Missing("GITHUB_APP_ID".to_string())));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let res = try_config_with(&[("MINIMUM_PATCH_OPEN_HOURS", "soon")]);
        assert!(matches!(res, Err(ConfigError::Invalid { .. })));
        let res = try_config_with(&[("DEFAULT_BRANCH_ONLY", "maybe")]);
        assert!(matches!(res, Err(ConfigError::Invalid { .. })));
        let res = try_config_with(&[("RECONCILE_INTERVAL_SECS", "0")]);
        assert!(matches!(res, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_windows_must_be_ordered() {
        let res = try_config_with(&[("MINIMUM_MINOR_OPEN_HOURS", "400")]);
        assert_eq!(res.err(), Some(ConfigError::UnorderedWindows));
        let config = config_with(&[("MINIMUM_MAJOR_OPEN_HOURS", "400"), ("DEFAULT_BRANCH_ONLY", "false")]);
        assert_eq!(config.minimum_major_open_time(), Duration::hours(400));
        assert!(!config.default_branch_only());
    }
}
