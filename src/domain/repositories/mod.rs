use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{
    ChannelConfig, DeliveryAttempt, Group, GroupMember, Message, MessageStatus,
};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: &Message) -> anyhow::Result<()>;

    /// Full rewrite of an unsent message (edits replace reminders and the
    /// recipient snapshot wholesale).
    async fn update(&self, message: &Message) -> anyhow::Result<()>;

    async fn get(&self, message_id: Uuid) -> anyhow::Result<Option<Message>>;

    /// Cascades reminders, snapshot rows and attempts.
    async fn delete(&self, message_id: Uuid) -> anyhow::Result<bool>;

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<Message>, bool)>;

    /// Atomic status transition: applies only while the stored status still
    /// equals `expected`, and reports whether this caller won.
    async fn cas_status(
        &self,
        message_id: Uuid,
        expected: MessageStatus,
        next: MessageStatus,
        failure_reason: Option<String>,
        sent_at: Option<DateTime<Utc>>,
        sent_by: Option<Uuid>,
    ) -> anyhow::Result<bool>;

    /// Flips a reminder's fired flag, false to true, exactly once.
    async fn mark_reminder_fired(
        &self,
        message_id: Uuid,
        reminder_id: Uuid,
    ) -> anyhow::Result<bool>;

    async fn set_timer_handles(
        &self,
        message_id: Uuid,
        handles: Vec<String>,
    ) -> anyhow::Result<()>;

    async fn log_attempt(&self, attempt: &DeliveryAttempt) -> anyhow::Result<()>;

    async fn attempts(&self, message_id: Uuid) -> anyhow::Result<Vec<DeliveryAttempt>>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn get(&self, group_id: Uuid) -> anyhow::Result<Option<Group>>;
    async fn members(&self, group_id: Uuid) -> anyhow::Result<Vec<GroupMember>>;
}

#[async_trait]
pub trait ChannelConfigRepository: Send + Sync {
    async fn enabled(&self, user_id: &Uuid) -> anyhow::Result<Vec<ChannelConfig>>;
}
