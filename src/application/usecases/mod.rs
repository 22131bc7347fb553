pub mod delete_message;
pub mod edit_message;
pub mod get_message;
pub mod get_message_attempts;
pub mod list_messages;
pub mod schedule_message;
