use poem_openapi::{Enum, Object};

use crate::domain::models::{
    ChannelType, DispatchKind, MessageStatus, RecurringInterval, RecurringUnit, ReminderUnit,
};
use crate::domain::schedule::ReminderSpec;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageStatusDto {
    Draft,
    Scheduled,
    Sent,
    Failed,
}

impl From<MessageStatus> for MessageStatusDto {
    fn from(value: MessageStatus) -> Self {
        match value {
            MessageStatus::Draft => MessageStatusDto::Draft,
            MessageStatus::Scheduled => MessageStatusDto::Scheduled,
            MessageStatus::Sent => MessageStatusDto::Sent,
            MessageStatus::Failed => MessageStatusDto::Failed,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelKind {
    #[oai(rename = "sms")]
    Sms,
    #[oai(rename = "email")]
    Email,
    #[oai(rename = "bridge")]
    Bridge,
}

impl From<ChannelType> for ChannelKind {
    fn from(value: ChannelType) -> Self {
        match value {
            ChannelType::Sms => ChannelKind::Sms,
            ChannelType::Email => ChannelKind::Email,
            ChannelType::Bridge => ChannelKind::Bridge,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReminderUnitKind {
    #[oai(rename = "minutes")]
    Minutes,
    #[oai(rename = "hours")]
    Hours,
    #[oai(rename = "days")]
    Days,
    #[oai(rename = "weeks")]
    Weeks,
    #[oai(rename = "months")]
    Months,
}

impl From<ReminderUnitKind> for ReminderUnit {
    fn from(value: ReminderUnitKind) -> Self {
        match value {
            ReminderUnitKind::Minutes => ReminderUnit::Minutes,
            ReminderUnitKind::Hours => ReminderUnit::Hours,
            ReminderUnitKind::Days => ReminderUnit::Days,
            ReminderUnitKind::Weeks => ReminderUnit::Weeks,
            ReminderUnitKind::Months => ReminderUnit::Months,
        }
    }
}

impl From<ReminderUnit> for ReminderUnitKind {
    fn from(value: ReminderUnit) -> Self {
        match value {
            ReminderUnit::Minutes => ReminderUnitKind::Minutes,
            ReminderUnit::Hours => ReminderUnitKind::Hours,
            ReminderUnit::Days => ReminderUnitKind::Days,
            ReminderUnit::Weeks => ReminderUnitKind::Weeks,
            ReminderUnit::Months => ReminderUnitKind::Months,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecurringUnitKind {
    #[oai(rename = "days")]
    Days,
    #[oai(rename = "weeks")]
    Weeks,
    #[oai(rename = "months")]
    Months,
    #[oai(rename = "years")]
    Years,
}

impl From<RecurringUnitKind> for RecurringUnit {
    fn from(value: RecurringUnitKind) -> Self {
        match value {
            RecurringUnitKind::Days => RecurringUnit::Days,
            RecurringUnitKind::Weeks => RecurringUnit::Weeks,
            RecurringUnitKind::Months => RecurringUnit::Months,
            RecurringUnitKind::Years => RecurringUnit::Years,
        }
    }
}

impl From<RecurringUnit> for RecurringUnitKind {
    fn from(value: RecurringUnit) -> Self {
        match value {
            RecurringUnit::Days => RecurringUnitKind::Days,
            RecurringUnit::Weeks => RecurringUnitKind::Weeks,
            RecurringUnit::Months => RecurringUnitKind::Months,
            RecurringUnit::Years => RecurringUnitKind::Years,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum AttemptKind {
    #[oai(rename = "reminder")]
    Reminder,
    #[oai(rename = "send")]
    Send,
}

impl From<DispatchKind> for AttemptKind {
    fn from(value: DispatchKind) -> Self {
        match value {
            DispatchKind::Reminder => AttemptKind::Reminder,
            DispatchKind::Send => AttemptKind::Send,
        }
    }
}

#[derive(Object, Copy, Clone, Debug)]
pub struct RecurringIntervalDto {
    #[oai(validator(minimum(value = "1"), maximum(value = "36")))]
    pub count: u32,
    pub unit: RecurringUnitKind,
}

impl From<RecurringIntervalDto> for RecurringInterval {
    fn from(value: RecurringIntervalDto) -> Self {
        Self {
            count: value.count,
            unit: value.unit.into(),
        }
    }
}

impl From<RecurringInterval> for RecurringIntervalDto {
    fn from(value: RecurringInterval) -> Self {
        Self {
            count: value.count,
            unit: value.unit.into(),
        }
    }
}

#[derive(Object, Copy, Clone, Debug)]
pub struct ReminderSpecDto {
    #[oai(validator(minimum(value = "1"), maximum(value = "36")))]
    pub count: u32,
    pub unit: ReminderUnitKind,
}

impl From<ReminderSpecDto> for ReminderSpec {
    fn from(value: ReminderSpecDto) -> Self {
        Self {
            count: value.count,
            unit: value.unit.into(),
        }
    }
}
