use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::{
    application::services::channel::ChannelSender,
    domain::models::{ChannelConfig, ChannelType, DeliveryContent},
};

const DEFAULT_SUBJECT: &str = "Message from your group";

/// SendGrid-style mail relay. The config credential is the API key, the
/// sender id the from address.
pub struct EmailSender {
    http: Client,
    base_url: String,
}

impl EmailSender {
    pub fn new() -> Arc<dyn ChannelSender> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("outreach/email")
                .build()
                .expect("failed to build email client"),
            base_url: "https://api.sendgrid.com".to_string(),
        }) as Arc<dyn ChannelSender>
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> ChannelType {
        ChannelType::Email
    }

    async fn send(
        &self,
        config: &ChannelConfig,
        address: &str,
        content: &DeliveryContent,
    ) -> anyhow::Result<()> {
        let from = config
            .sender_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("email channel requires a from address"))?;

        let payload = json!({
            "personalizations": [{ "to": [{ "email": address }] }],
            "from": { "email": from },
            "subject": content.subject.as_deref().unwrap_or(DEFAULT_SUBJECT),
            "content": [{ "type": "text/plain", "value": content.body }],
        });

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&config.credential)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("email api returned {status}: {detail}");
        }
        Ok(())
    }
}
