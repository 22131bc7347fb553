use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::ChannelType;

/// Frozen copy of a group member taken when a message leaves draft.
/// Later edits to the group must not affect it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientSnapshot {
    pub member_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bridge_user_id: Option<String>,
    pub notes: Option<String>,
    pub is_recipient: bool,
}

impl RecipientSnapshot {
    pub fn address_for(&self, channel: ChannelType) -> Option<&str> {
        match channel {
            ChannelType::Sms => self.phone.as_deref(),
            ChannelType::Email => self.email.as_deref(),
            ChannelType::Bridge => self.bridge_user_id.as_deref(),
        }
    }
}
