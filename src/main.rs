use std::env;
use std::sync::Arc;

mod core;
mod github;
mod logger;
mod pubsub;
mod utils;

use crate::core::context::GovernanceContext;
use crate::core::reconcile;
use crate::github::auth::GithubApp;
use crate::utils::config::GovernanceConfig;

#[tokio::main]
async fn main() {
    let config = match GovernanceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[main] Invalid configuration: {}", e);
            return;
        }
    };
    if !logger::init::init_logger(config.log_dir(), config.log_level()) {
        eprintln!("[main] Unable to initialize file logger");
    }

    // Webhooks arrive through a pubsub topic named after the deployment.
    let (gcp_credentials, topic_name) = match (env::var("GCP_CREDENTIALS"), env::var("INSTALL_ID")) {
        (Ok(credentials), Ok(topic)) => (credentials, topic),
        _ => {
            log::error!("[main] GCP_CREDENTIALS and INSTALL_ID must be set");
            return;
        }
    };
    log::info!("[main] env vars = {}, {}", &gcp_credentials, &topic_name);

    let app = match GithubApp::from_config(&config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("[main] Unable to set up github app: {}", e);
            return;
        }
    };
    let ctx = Arc::new(GovernanceContext::new(config, Arc::new(app)));
    let reconciler = reconcile::start(ctx.clone());

    tokio::select! {
        res = pubsub::listener::listen_messages(&ctx, &gcp_credentials, &topic_name) => {
            if let Err(e) = res {
                log::error!("[main] Listener stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("[main] Shutdown requested");
        }
    }
    reconciler.stop().await;
}
