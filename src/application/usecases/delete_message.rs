use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::services::scheduler::{self, SchedulerQueue},
    domain::{errors::DomainError, repositories::MessageRepository},
};

pub struct DeleteMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    scheduler: Arc<dyn SchedulerQueue>,
}

impl DeleteMessageUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, scheduler: Arc<dyn SchedulerQueue>) -> Self {
        Self {
            messages,
            scheduler,
        }
    }

    /// Cancels any pending timers first; a callback that still races the
    /// delete finds no message and does nothing.
    pub async fn execute(&self, user_id: Uuid, message_id: Uuid) -> Result<(), DomainError> {
        let message = self
            .messages
            .get(message_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message {message_id}")))?;
        if message.user_id != user_id {
            return Err(DomainError::Forbidden(
                "message does not belong to user".to_string(),
            ));
        }

        scheduler::cancel_timers(self.scheduler.as_ref(), &message.timer_handles).await?;
        self.messages.delete(message_id).await?;
        Ok(())
    }
}
