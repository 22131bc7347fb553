use chrono::{DateTime, Utc};
use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{RecurringIntervalDto, ReminderSpecDto};

#[derive(Object, Debug)]
pub struct RecipientChoiceDto {
    pub member_id: Uuid,
    pub included: bool,
}

#[derive(Object, Debug)]
pub struct ComposeMessageRequestDto {
    pub group_id: Uuid,
    #[oai(validator(max_length = 256))]
    pub subject: Option<String>,
    #[oai(validator(min_length = 1, max_length = 4096))]
    pub body: String,
    #[oai(default)]
    pub is_scheduled: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[oai(default)]
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringIntervalDto>,
    #[oai(default)]
    pub is_reminders: bool,
    #[oai(default)]
    pub reminders: Vec<ReminderSpecDto>,
    #[oai(default)]
    pub recipients: Vec<RecipientChoiceDto>,
    #[oai(default)]
    pub save_as_draft: bool,
}

#[derive(Object, Debug)]
pub struct DueCallbackDto {
    #[oai(validator(min_length = 1))]
    pub token: String,
}
