use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{errors::DomainError, models::Message, repositories::MessageRepository};

pub struct ListMessagesUseCase {
    messages: Arc<dyn MessageRepository>,
}

pub struct ListMessagesResponse {
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

impl ListMessagesUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    pub async fn execute(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<ListMessagesResponse, DomainError> {
        let (messages, has_more) = self.messages.list_by_user(user_id, limit, offset).await?;
        let next_offset = if has_more {
            Some(offset.unwrap_or(0) + messages.len() as u32)
        } else {
            None
        };
        Ok(ListMessagesResponse {
            messages,
            has_more,
            next_offset,
        })
    }
}
