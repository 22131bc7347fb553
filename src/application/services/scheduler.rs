use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::events::DueEvent;
use crate::domain::models::{DispatchKind, Message};
use crate::domain::schedule;

/// External delayed-delivery queue: one job per enqueued timestamp, handed
/// back as a due callback, at least once.
#[async_trait]
pub trait SchedulerQueue: Send + Sync {
    async fn enqueue(&self, fire_at: DateTime<Utc>, event: DueEvent) -> anyhow::Result<String>;

    /// Cancelling an already-fired or unknown handle is not an error.
    async fn cancel(&self, handle: &str) -> anyhow::Result<()>;
}

/// Enqueue every timer a finalized message needs: one per reminder at its
/// lead time, plus the send itself (now, when there is no schedule).
pub async fn enqueue_message_timers(
    scheduler: &dyn SchedulerQueue,
    message: &Message,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<String>> {
    let send_at = message.scheduled_at.unwrap_or(now);
    let mut handles = Vec::with_capacity(message.reminders.len() + 1);

    for reminder in &message.reminders {
        let fire_at = schedule::reminder_fire_at(reminder.count, reminder.unit, send_at);
        let handle = scheduler
            .enqueue(
                fire_at,
                DueEvent {
                    message_id: message.id,
                    kind: DispatchKind::Reminder,
                    reminder_id: Some(reminder.id),
                },
            )
            .await?;
        handles.push(handle);
    }

    let handle = scheduler
        .enqueue(
            send_at,
            DueEvent {
                message_id: message.id,
                kind: DispatchKind::Send,
                reminder_id: None,
            },
        )
        .await?;
    handles.push(handle);

    Ok(handles)
}

pub async fn cancel_timers(
    scheduler: &dyn SchedulerQueue,
    handles: &[String],
) -> anyhow::Result<()> {
    for handle in handles {
        scheduler.cancel(handle).await?;
    }
    Ok(())
}
