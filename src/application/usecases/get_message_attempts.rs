use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError, models::DeliveryAttempt, repositories::MessageRepository,
};

pub struct GetMessageAttemptsUseCase {
    messages: Arc<dyn MessageRepository>,
}

impl GetMessageAttemptsUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    pub async fn execute(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<DeliveryAttempt>, DomainError> {
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
        self.messages.attempts(message_id).await.map_err(Into::into)
    }
}
