use std::collections::{HashMap, VecDeque};

use futures_util::StreamExt;
use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_default::WithAuthExt;
use google_cloud_pubsub::{
    client::{Client, ClientConfig},
    subscription::{Subscription, SubscriptionConfig},
};
use sha256::digest;
use thiserror::Error;
use tonic::Code;

use crate::core::context::GovernanceContext;
use crate::core::dispatcher::handle_event;
use crate::utils::webhook_event::EventEnvelope;

const WEBHOOK_MSGTYPE: &str = "webhook_callback";
const DEDUPE_WINDOW: usize = 100;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("unable to load pubsub credentials: {0}")]
    Credentials(String),
    #[error("pubsub request failed: {0}")]
    Pubsub(String),
}

/// Remembers the digests of the last `capacity` messages so that redeliveries
/// are processed once.
pub struct RecentDigests {
    capacity: usize,
    digests: VecDeque<String>,
}

impl RecentDigests {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            digests: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns false if the message was already seen.
    pub fn insert(&mut self, data: &[u8]) -> bool {
        let message_hash = digest(data);
        if self.digests.contains(&message_hash) {
            return false;
        }
        self.digests.push_back(message_hash);
        while self.digests.len() > self.capacity {
            self.digests.pop_front();
        }
        true
    }
}

async fn process_message(ctx: &GovernanceContext, attributes: &HashMap<String, String>, data_bytes: &[u8]) {
    let Some(msgtype) = attributes.get("msgtype") else {
        log::error!("[process_message] msgtype attribute not found in message, attr: {:?}", attributes);
        return;
    };
    if msgtype != WEBHOOK_MSGTYPE {
        log::error!("[process_message] Message type not handled: {}", msgtype);
        return;
    }
    let envelope = match serde_json::from_slice::<EventEnvelope>(data_bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::error!("[process_message] Unable to deserialize webhook envelope: {:?}", e);
            return;
        }
    };
    let event_name = envelope.event_name.clone();
    match handle_event(ctx, envelope).await {
        Ok(()) => log::info!("[process_message] {} event processed", event_name),
        Err(e) => log::error!("[process_message] {} event failed: {}", event_name, e),
    }
}

async fn get_pubsub_client_config(keypath: &str) -> Result<ClientConfig, ListenerError> {
    let credfile = CredentialsFile::new_from_file(keypath.to_string())
        .await
        .map_err(|e| ListenerError::Credentials(format!("{:?}", e)))?;
    ClientConfig::default()
        .with_credentials(credfile)
        .await
        .map_err(|e| ListenerError::Credentials(format!("{:?}", e)))
}

async fn setup_subscription(keypath: &str, topicname: &str) -> Result<Subscription, ListenerError> {
    let config = get_pubsub_client_config(keypath).await?;
    let client = Client::new(config)
        .await
        .map_err(|e| ListenerError::Pubsub(format!("{:?}", e)))?;
    let topic = client.topic(topicname);
    if let Err(e) = topic.exists(None).await {
        if e.code() == Code::NotFound {
            client
                .create_topic(topicname, None, None)
                .await
                .map_err(|e| ListenerError::Pubsub(format!("{:?}", e)))?;
        } else {
            log::error!("[setup_subscription] Error getting topic: {:?}", e);
        }
    }
    let sub_config = SubscriptionConfig {
        enable_message_ordering: true,
        ..Default::default()
    };
    let subscription_name = format!("{topicname}-sub");
    let subscription = client.subscription(&subscription_name);
    let exists = subscription
        .exists(None)
        .await
        .map_err(|e| ListenerError::Pubsub(format!("{:?}", e)))?;
    if !exists {
        subscription
            .create(topic.fully_qualified_name(), sub_config, None)
            .await
            .map_err(|e| ListenerError::Pubsub(format!("{:?}", e)))?;
    }
    log::debug!("[setup_subscription] sub = {:?}", &subscription);
    Ok(subscription)
}

/// Consumes webhook envelopes one at a time until the stream ends.
pub async fn listen_messages(ctx: &GovernanceContext, keypath: &str, topicname: &str) -> Result<(), ListenerError> {
    let mut recent = RecentDigests::new(DEDUPE_WINDOW);
    let subscription = setup_subscription(keypath, topicname).await?;
    let mut stream = subscription
        .subscribe(None)
        .await
        .map_err(|e| ListenerError::Pubsub(format!("{:?}", e)))?;
    log::info!("[listen_messages] Listening for messages on {}", topicname);
    while let Some(message) = stream.next().await {
        let attrmap: HashMap<String, String> = message.message.attributes.clone().into_iter().collect();
        if recent.insert(&message.message.data) {
            process_message(ctx, &attrmap, &message.message.data).await;
        } else {
            log::debug!("[listen_messages] Skipping redelivered message");
        }
        if let Err(e) = message.ack().await {
            log::error!("[listen_messages] Unable to ack message: {:?}", e);
        }
    }
    Ok(())
}
