use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Sms,
    Email,
    Bridge,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Sms => "sms",
            ChannelType::Email => "email",
            ChannelType::Bridge => "bridge",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "sms" => Some(ChannelType::Sms),
            "email" => Some(ChannelType::Email),
            "bridge" => Some(ChannelType::Bridge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChannelConfigStatus {
    Active,
    Inactive,
}

/// Per-user channel credentials, owned by the account tier; an Active row
/// means the channel takes part in that user's sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: Uuid,
    pub user_id: Uuid,
    pub channel: ChannelType,
    pub credential: String,
    pub sender_id: Option<String>,
    pub status: ChannelConfigStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
