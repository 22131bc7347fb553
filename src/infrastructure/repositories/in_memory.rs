use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{
        ChannelConfig, ChannelConfigStatus, DeliveryAttempt, Group, GroupMember, Message,
        MessageStatus,
    },
    repositories::{ChannelConfigRepository, GroupRepository, MessageRepository},
};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<Uuid, Message>>>,
    attempts: Arc<RwLock<Vec<DeliveryAttempt>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_recurrence_of(&self, message_id: Uuid) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages
            .values()
            .find(|m| m.recurrence_of == Some(message_id))
            .cloned())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn update(&self, message: &Message) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn get(&self, message_id: Uuid) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.get(&message_id).cloned())
    }

    async fn delete(&self, message_id: Uuid) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        let removed = messages.remove(&message_id).is_some();
        if removed {
            let mut attempts = self.attempts.write().await;
            attempts.retain(|a| a.message_id != message_id);
        }
        Ok(removed)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<Message>, bool)> {
        let limit = limit.unwrap_or(50).min(200) as usize;
        let offset = offset.unwrap_or(0) as usize;

        let messages = self.messages.read().await;
        let mut entries: Vec<Message> = messages
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page: Vec<Message> = entries.into_iter().skip(offset).take(limit + 1).collect();
        let has_more = page.len() > limit;
        Ok((page.into_iter().take(limit).collect(), has_more))
    }

    async fn cas_status(
        &self,
        message_id: Uuid,
        expected: MessageStatus,
        next: MessageStatus,
        failure_reason: Option<String>,
        sent_at: Option<DateTime<Utc>>,
        sent_by: Option<Uuid>,
    ) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        let Some(entry) = messages.get_mut(&message_id) else {
            return Ok(false);
        };
        if entry.status != expected {
            return Ok(false);
        }
        entry.status = next;
        entry.failure_reason = failure_reason;
        if sent_at.is_some() {
            entry.sent_at = sent_at;
        }
        if sent_by.is_some() {
            entry.sent_by = sent_by;
        }
        entry.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_reminder_fired(
        &self,
        message_id: Uuid,
        reminder_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        let Some(entry) = messages.get_mut(&message_id) else {
            return Ok(false);
        };
        let Some(reminder) = entry.reminders.iter_mut().find(|r| r.id == reminder_id) else {
            return Ok(false);
        };
        if reminder.fired {
            return Ok(false);
        }
        reminder.fired = true;
        entry.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_timer_handles(
        &self,
        message_id: Uuid,
        handles: Vec<String>,
    ) -> anyhow::Result<()> {
        let mut messages = self.messages.write().await;
        if let Some(entry) = messages.get_mut(&message_id) {
            entry.timer_handles = handles;
        }
        Ok(())
    }

    async fn log_attempt(&self, attempt: &DeliveryAttempt) -> anyhow::Result<()> {
        let mut attempts = self.attempts.write().await;
        attempts.push(attempt.clone());
        Ok(())
    }

    async fn attempts(&self, message_id: Uuid) -> anyhow::Result<Vec<DeliveryAttempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .iter()
            .filter(|a| a.message_id == message_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Arc<RwLock<HashMap<Uuid, Group>>>,
    members: Arc<RwLock<Vec<GroupMember>>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_group(&self, group: Group) {
        let mut groups = self.groups.write().await;
        groups.insert(group.id, group);
    }

    pub async fn put_member(&self, member: GroupMember) {
        let mut members = self.members.write().await;
        members.push(member);
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn get(&self, group_id: Uuid) -> anyhow::Result<Option<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.get(&group_id).cloned())
    }

    async fn members(&self, group_id: Uuid) -> anyhow::Result<Vec<GroupMember>> {
        let members = self.members.read().await;
        Ok(members
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryChannelConfigRepository {
    configs: Arc<RwLock<Vec<ChannelConfig>>>,
}

impl InMemoryChannelConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, config: ChannelConfig) {
        let mut configs = self.configs.write().await;
        configs.push(config);
    }
}

#[async_trait]
impl ChannelConfigRepository for InMemoryChannelConfigRepository {
    async fn enabled(&self, user_id: &Uuid) -> anyhow::Result<Vec<ChannelConfig>> {
        let configs = self.configs.read().await;
        Ok(configs
            .iter()
            .filter(|c| c.user_id == *user_id && c.status == ChannelConfigStatus::Active)
            .cloned()
            .collect())
    }
}
