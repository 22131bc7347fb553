use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::ChannelType;
use super::recipient::RecipientSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Draft,
    Scheduled,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Draft => "draft",
            MessageStatus::Scheduled => "scheduled",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(MessageStatus::Draft),
            "scheduled" => Some(MessageStatus::Scheduled),
            "sent" => Some(MessageStatus::Sent),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl ReminderUnit {
    pub const ALL: [ReminderUnit; 5] = [
        ReminderUnit::Minutes,
        ReminderUnit::Hours,
        ReminderUnit::Days,
        ReminderUnit::Weeks,
        ReminderUnit::Months,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderUnit::Minutes => "minutes",
            ReminderUnit::Hours => "hours",
            ReminderUnit::Days => "days",
            ReminderUnit::Weeks => "weeks",
            ReminderUnit::Months => "months",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "minutes" => Some(ReminderUnit::Minutes),
            "hours" => Some(ReminderUnit::Hours),
            "days" => Some(ReminderUnit::Days),
            "weeks" => Some(ReminderUnit::Weeks),
            "months" => Some(ReminderUnit::Months),
            _ => None,
        }
    }

    // Fixed-width units: month = 30 days, week = 7 days, day = 24 hours.
    pub const fn millis(self) -> i64 {
        const MINUTE: i64 = 60 * 1000;
        match self {
            ReminderUnit::Minutes => MINUTE,
            ReminderUnit::Hours => 60 * MINUTE,
            ReminderUnit::Days => 24 * 60 * MINUTE,
            ReminderUnit::Weeks => 7 * 24 * 60 * MINUTE,
            ReminderUnit::Months => 30 * 24 * 60 * MINUTE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecurringUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl RecurringUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringUnit::Days => "days",
            RecurringUnit::Weeks => "weeks",
            RecurringUnit::Months => "months",
            RecurringUnit::Years => "years",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "days" => Some(RecurringUnit::Days),
            "weeks" => Some(RecurringUnit::Weeks),
            "months" => Some(RecurringUnit::Months),
            "years" => Some(RecurringUnit::Years),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringInterval {
    pub count: u32,
    pub unit: RecurringUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub id: Uuid,
    pub count: u32,
    pub unit: ReminderUnit,
    pub fired: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchKind {
    Reminder,
    Send,
}

impl DispatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchKind::Reminder => "reminder",
            DispatchKind::Send => "send",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "reminder" => Some(DispatchKind::Reminder),
            "send" => Some(DispatchKind::Send),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryContent {
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub subject: Option<String>,
    pub body: String,
    pub status: MessageStatus,
    pub failure_reason: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub recurring_interval: Option<RecurringInterval>,
    pub reminders: Vec<Reminder>,
    pub recipients: Vec<RecipientSnapshot>,
    pub recurrence_of: Option<Uuid>,
    pub timer_handles: Vec<String>,
    pub created_by: Uuid,
    pub sent_by: Option<Uuid>,
    pub last_updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn reminder(&self, reminder_id: Uuid) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == reminder_id)
    }

    pub fn content(&self) -> DeliveryContent {
        DeliveryContent {
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: Uuid,
    pub message_id: Uuid,
    pub member_id: Uuid,
    pub channel: ChannelType,
    pub kind: DispatchKind,
    pub ok: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
