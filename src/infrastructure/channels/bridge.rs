use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    application::services::channel::ChannelSender,
    domain::models::{ChannelConfig, ChannelType, DeliveryContent},
};

/// GroupMe-style group-chat bridge: direct messages to each recipient's
/// bridge identity. The config credential is the bridge access token.
pub struct BridgeSender {
    http: Client,
    base_url: String,
}

impl BridgeSender {
    pub fn new() -> Arc<dyn ChannelSender> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("outreach/bridge")
                .build()
                .expect("failed to build bridge client"),
            base_url: "https://api.groupme.com".to_string(),
        }) as Arc<dyn ChannelSender>
    }
}

#[async_trait]
impl ChannelSender for BridgeSender {
    fn channel(&self) -> ChannelType {
        ChannelType::Bridge
    }

    async fn send(
        &self,
        config: &ChannelConfig,
        address: &str,
        content: &DeliveryContent,
    ) -> anyhow::Result<()> {
        // the bridge renders no subject line either
        let text = match &content.subject {
            Some(subject) => format!("{subject}\n\n{}", content.body),
            None => content.body.clone(),
        };

        let response = self
            .http
            .post(format!("{}/v3/direct_messages", self.base_url))
            .query(&[("token", config.credential.as_str())])
            .json(&json!({
                "direct_message": {
                    "source_guid": uuid::Uuid::new_v4().to_string(),
                    "recipient_id": address,
                    "text": text,
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail: Option<BridgeEnvelope> = response.json().await.ok();
            let errors = detail
                .map(|e| e.meta.errors.join(", "))
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("bridge api returned {status}: {errors}");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct BridgeEnvelope {
    meta: BridgeMeta,
}

#[derive(Debug, Deserialize)]
struct BridgeMeta {
    #[serde(default)]
    errors: Vec<String>,
}
