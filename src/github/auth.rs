use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::json;

use super::api::{AppApi, GithubError, InstallationApi};
use super::client::GithubInstallation;
use super::config::{deserialize_response, send_json, GithubConnection};
use super::repos::list_installations;
use crate::utils::config::GovernanceConfig;
use crate::utils::github_auth_info::GithubAuthInfo;

#[derive(Debug, Serialize)]
struct Claims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// GitHub App principal. Owns the installation token cache for the process.
pub struct GithubApp {
    client: Client,
    base_url: String,
    app_id: String,
    encoding_key: EncodingKey,
    tokens: Mutex<HashMap<u64, GithubAuthInfo>>,
}

impl GithubApp {
    pub fn new(client: Client, base_url: &str, app_id: &str, encoding_key: EncodingKey) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            app_id: app_id.to_string(),
            encoding_key,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &GovernanceConfig) -> Result<Self, GithubError> {
        let pem_data = fs::read(config.private_key_path()).map_err(|e| {
            log::error!("[GithubApp::from_config] Error reading pem file {}: {:?}", config.private_key_path(), e);
            GithubError::Auth(format!("unable to read {}", config.private_key_path()))
        })?;
        let encoding_key = EncodingKey::from_rsa_pem(&pem_data)
            .map_err(|e| GithubError::Auth(format!("invalid private key: {}", e)))?;
        Ok(Self::new(Client::new(), config.github_base_url(), config.github_app_id(), encoding_key))
    }

    fn generate_jwt(&self) -> Result<String, GithubError> {
        let now = Utc::now();
        let claims = Claims {
            // Backdated to tolerate clock drift between us and GitHub.
            iat: (now - Duration::seconds(60)).timestamp(),
            exp: (now + Duration::minutes(9)).timestamp(),
            iss: self.app_id.clone(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| GithubError::Auth(format!("unable to encode JWT: {}", e)))
    }

    fn app_connection(&self) -> Result<GithubConnection, GithubError> {
        let jwt = self.generate_jwt()?;
        Ok(GithubConnection::new(self.client.clone(), &self.base_url, &jwt))
    }

    fn cached_token(&self, installation_id: u64) -> Option<GithubAuthInfo> {
        let tokens = match self.tokens.lock() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens
            .get(&installation_id)
            .filter(|info| info.is_fresh(Utc::now()))
            .cloned()
    }

    fn store_token(&self, installation_id: u64, auth_info: GithubAuthInfo) {
        let mut tokens = match self.tokens.lock() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.insert(installation_id, auth_info);
    }

    async fn fetch_access_token(&self, installation_id: u64) -> Result<GithubAuthInfo, GithubError> {
        let conn = self.app_connection()?;
        let url = conn.url(&format!("/app/installations/{}/access_tokens", installation_id));
        let response = send_json(&conn, Method::POST, &url, &json!({})).await?;
        let auth_info: GithubAuthInfo = deserialize_response(&url, response).await?;
        log::info!(
            "[fetch_access_token] New token for installation {} expires at {}",
            installation_id,
            auth_info.expires_at()
        );
        Ok(auth_info)
    }

    pub async fn access_token(&self, installation_id: u64) -> Result<String, GithubError> {
        if let Some(auth_info) = self.cached_token(installation_id) {
            return Ok(auth_info.token().clone());
        }
        let auth_info = self.fetch_access_token(installation_id).await?;
        let token = auth_info.token().clone();
        self.store_token(installation_id, auth_info);
        Ok(token)
    }
}

#[async_trait]
impl AppApi for GithubApp {
    async fn list_installations(&self) -> Result<Vec<u64>, GithubError> {
        let conn = self.app_connection()?;
        list_installations(&conn).await
    }

    async fn installation(&self, installation_id: u64) -> Result<Arc<dyn InstallationApi>, GithubError> {
        let token = self.access_token(installation_id).await?;
        let conn = GithubConnection::new(self.client.clone(), &self.base_url, &token);
        Ok(Arc::new(GithubInstallation::new(conn)))
    }
}
