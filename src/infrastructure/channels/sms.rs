use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    application::services::channel::ChannelSender,
    domain::models::{ChannelConfig, ChannelType, DeliveryContent},
};

/// Twilio-style SMS carrier API. The config credential is
/// `account_sid:auth_token`, the sender id the originating number.
pub struct SmsSender {
    http: Client,
    base_url: String,
}

impl SmsSender {
    pub fn new() -> Arc<dyn ChannelSender> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("outreach/sms")
                .build()
                .expect("failed to build sms client"),
            base_url: "https://api.twilio.com".to_string(),
        }) as Arc<dyn ChannelSender>
    }

    #[cfg(test)]
    fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> ChannelType {
        ChannelType::Sms
    }

    async fn send(
        &self,
        config: &ChannelConfig,
        address: &str,
        content: &DeliveryContent,
    ) -> anyhow::Result<()> {
        let Some((account_sid, auth_token)) = config.credential.split_once(':') else {
            anyhow::bail!("sms credential must be account_sid:auth_token");
        };
        let from = config
            .sender_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("sms channel requires a sender number"))?;

        // SMS has no subject line; fold it into the body.
        let body = match &content.subject {
            Some(subject) => format!("{subject}\n\n{}", content.body),
            None => content.body.clone(),
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, account_sid
        );
        let response = self
            .http
            .post(url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[("To", address), ("From", from), ("Body", body.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("sms api returned {status}: {detail}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::models::ChannelConfigStatus;

    fn config(credential: &str, sender_id: Option<&str>) -> ChannelConfig {
        let now = Utc::now();
        ChannelConfig {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            channel: ChannelType::Sms,
            credential: credential.to_string(),
            sender_id: sender_id.map(String::from),
            status: ChannelConfigStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn malformed_credential_is_rejected_before_any_request() {
        let sender = SmsSender::with_base_url("http://127.0.0.1:1".to_string());
        let err = sender
            .send(
                &config("missing-separator", Some("+15550000")),
                "+15550001",
                &DeliveryContent {
                    subject: None,
                    body: "hello".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("account_sid:auth_token"));
    }

    #[tokio::test]
    async fn missing_sender_number_is_rejected() {
        let sender = SmsSender::with_base_url("http://127.0.0.1:1".to_string());
        let err = sender
            .send(
                &config("sid:token", None),
                "+15550001",
                &DeliveryContent {
                    subject: None,
                    body: "hello".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sender number"));
    }
}
