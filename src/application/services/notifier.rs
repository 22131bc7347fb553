use async_trait::async_trait;

use crate::domain::events::MessageStatusEvent;

/// Fire-and-forget push of a terminal send outcome back to the sender's
/// session. Publish failures never unwind a status that is already stored.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn publish(&self, event: MessageStatusEvent) -> anyhow::Result<()>;
}
