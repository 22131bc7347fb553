use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::{DispatchKind, MessageStatus};

/// Payload round-tripped through the external queue: enqueued at schedule
/// time, handed back when the timestamp arrives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DueEvent {
    pub message_id: Uuid,
    pub kind: DispatchKind,
    pub reminder_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStatusEvent {
    pub user_id: Uuid,
    pub message_id: Uuid,
    pub status: MessageStatus,
    pub group_name: String,
    pub occurred_at: DateTime<Utc>,
}
