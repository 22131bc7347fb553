use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::{application::services::notifier::StatusNotifier, domain::events::MessageStatusEvent};

/// Stand-in notifier for deployments without a pub/sub broker.
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Arc<dyn StatusNotifier> {
        Arc::new(Self) as Arc<dyn StatusNotifier>
    }
}

#[async_trait]
impl StatusNotifier for LogNotifier {
    async fn publish(&self, event: MessageStatusEvent) -> anyhow::Result<()> {
        info!(
            user_id = %event.user_id,
            message_id = %event.message_id,
            status = event.status.as_str(),
            group = %event.group_name,
            "message status"
        );
        Ok(())
    }
}
