use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::{application::services::notifier::StatusNotifier, domain::events::MessageStatusEvent};

/// Pushes terminal send outcomes over NATS; the web tier subscribes to the
/// sender's `user-{id}` subject and forwards to their session.
pub struct NatsNotifier {
    client: async_nats::Client,
}

impl NatsNotifier {
    pub async fn connect(url: &str) -> anyhow::Result<Arc<dyn StatusNotifier>> {
        let client = async_nats::connect(url).await?;
        Ok(Arc::new(Self { client }) as Arc<dyn StatusNotifier>)
    }
}

#[async_trait]
impl StatusNotifier for NatsNotifier {
    async fn publish(&self, event: MessageStatusEvent) -> anyhow::Result<()> {
        let subject = format!("user-{}", event.user_id);
        let payload = serde_json::to_vec(&json!({
            "event": "message-status",
            "payload": {
                "status": event.status,
                "message_id": event.message_id,
                "group_name": event.group_name,
                "occurred_at": event.occurred_at,
            },
        }))?;
        self.client.publish(subject, payload.into()).await?;
        Ok(())
    }
}
