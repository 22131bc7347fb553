use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{
    AttemptKind, ChannelKind, MessageStatusDto, RecurringIntervalDto, ReminderUnitKind,
};

#[derive(Object, Debug)]
pub struct MessageIdResponseDto {
    pub message_id: Uuid,
}

#[derive(Object, Debug)]
pub struct ReminderDto {
    pub count: u32,
    pub unit: ReminderUnitKind,
    pub fired: bool,
}

#[derive(Object, Debug)]
pub struct RecipientSnapshotDto {
    pub member_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bridge_user_id: Option<String>,
    pub notes: Option<String>,
    pub is_recipient: bool,
}

#[derive(Object, Debug)]
pub struct MessageDto {
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: MessageStatusDto,
    pub failure_reason: Option<String>,
    pub scheduled_at: Option<String>,
    pub recurring_interval: Option<RecurringIntervalDto>,
    pub reminders: Vec<ReminderDto>,
    pub recipients: Vec<RecipientSnapshotDto>,
    pub recurrence_of: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub sent_at: Option<String>,
}

#[derive(Object, Debug)]
pub struct PaginatedMessagesDto {
    pub messages: Vec<MessageDto>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

#[derive(Object, Debug)]
pub struct DeliveryAttemptDto {
    pub id: Uuid,
    pub member_id: Uuid,
    pub channel: ChannelKind,
    pub kind: AttemptKind,
    pub ok: bool,
    pub error: Option<String>,
    pub created_at: String,
}

#[derive(Object, Debug)]
pub struct CallbackAckDto {
    pub status: String,
}
