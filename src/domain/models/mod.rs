pub mod channel;
pub mod group;
pub mod message;
pub mod recipient;

pub use channel::{ChannelConfig, ChannelConfigStatus, ChannelType};
pub use group::{Group, GroupMember};
pub use message::{
    DeliveryAttempt, DeliveryContent, DispatchKind, Message, MessageStatus, RecurringInterval,
    RecurringUnit, Reminder, ReminderUnit,
};
pub use recipient::RecipientSnapshot;
