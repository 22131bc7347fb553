use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::services::{
        channel::{ChannelGateway, ChannelSender},
        notifier::StatusNotifier,
        scheduler::{self, SchedulerQueue},
    },
    domain::{
        events::{DueEvent, MessageStatusEvent},
        models::{
            ChannelConfig, ChannelType, DeliveryAttempt, DeliveryContent, DispatchKind, Message,
            MessageStatus, Reminder,
        },
        repositories::{ChannelConfigRepository, MessageRepository},
        schedule,
    },
};

const MAX_CONCURRENT_SENDS: usize = 8;

/// Handles due callbacks from the scheduler: fans the message out to every
/// enabled channel, settles the aggregate status, notifies the sender, and
/// re-enters recurring messages.
///
/// Callbacks arrive at least once, so every path is a no-op when the
/// message is gone or its status has already settled.
pub struct DispatchHandler {
    messages: Arc<dyn MessageRepository>,
    channels: Arc<dyn ChannelConfigRepository>,
    gateway: ChannelGateway,
    notifier: Arc<dyn StatusNotifier>,
    scheduler: Arc<dyn SchedulerQueue>,
}

struct SendOutcome {
    member_id: Uuid,
    channel: ChannelType,
    error: Option<String>,
}

async fn send_one(
    sender: Arc<dyn ChannelSender>,
    config: ChannelConfig,
    member_id: Uuid,
    address: String,
    content: DeliveryContent,
) -> SendOutcome {
    let result = sender.send(&config, &address, &content).await;
    if let Err(err) = &result {
        warn!(
            channel = config.channel.as_str(),
            member_id = %member_id,
            error = %err,
            "channel send failed"
        );
    }
    SendOutcome {
        member_id,
        channel: config.channel,
        error: result.err().map(|e| e.to_string()),
    }
}

impl DispatchHandler {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        channels: Arc<dyn ChannelConfigRepository>,
        gateway: ChannelGateway,
        notifier: Arc<dyn StatusNotifier>,
        scheduler: Arc<dyn SchedulerQueue>,
    ) -> Self {
        Self {
            messages,
            channels,
            gateway,
            notifier,
            scheduler,
        }
    }

    pub async fn handle(&self, event: DueEvent) -> anyhow::Result<()> {
        match event.kind {
            DispatchKind::Send => self.handle_send(event.message_id).await,
            DispatchKind::Reminder => self.handle_reminder(event).await,
        }
    }

    async fn handle_send(&self, message_id: Uuid) -> anyhow::Result<()> {
        let Some(message) = self.messages.get(message_id).await? else {
            debug!(message_id = %message_id, "due send for unknown message, skipping");
            return Ok(());
        };
        if message.status != MessageStatus::Scheduled {
            debug!(
                message_id = %message_id,
                status = message.status.as_str(),
                "due send for a settled message, skipping"
            );
            return Ok(());
        }

        let configs = self.channels.enabled(&message.user_id).await?;
        let outcomes = self
            .fan_out(&message, &configs, &message.content(), DispatchKind::Send)
            .await?;

        let now = Utc::now();
        let failures: Vec<String> = outcomes.iter().filter_map(|o| o.error.clone()).collect();
        let (next, failure_reason, sent_at, sent_by) = if failures.is_empty() {
            (MessageStatus::Sent, None, Some(now), Some(message.user_id))
        } else {
            (MessageStatus::Failed, Some(failures.join("; ")), None, None)
        };

        let applied = self
            .messages
            .cas_status(
                message.id,
                MessageStatus::Scheduled,
                next,
                failure_reason,
                sent_at,
                sent_by,
            )
            .await?;
        if !applied {
            warn!(message_id = %message.id, "status already settled by another delivery");
            return Ok(());
        }

        info!(
            message_id = %message.id,
            status = next.as_str(),
            attempts = outcomes.len(),
            "dispatch settled"
        );

        let status_event = MessageStatusEvent {
            user_id: message.user_id,
            message_id: message.id,
            status: next,
            group_name: message.group_name.clone(),
            occurred_at: now,
        };
        if let Err(err) = self.notifier.publish(status_event).await {
            warn!(message_id = %message.id, error = %err, "status notification failed");
        }

        if next == MessageStatus::Sent && message.recurring_interval.is_some() {
            self.schedule_next_occurrence(&message, now).await?;
        }

        Ok(())
    }

    async fn handle_reminder(&self, event: DueEvent) -> anyhow::Result<()> {
        let Some(reminder_id) = event.reminder_id else {
            anyhow::bail!("reminder callback without a reminder id");
        };
        let Some(message) = self.messages.get(event.message_id).await? else {
            debug!(message_id = %event.message_id, "due reminder for unknown message, skipping");
            return Ok(());
        };
        if message.status != MessageStatus::Scheduled {
            debug!(message_id = %message.id, "due reminder for a settled message, skipping");
            return Ok(());
        }
        if message.reminder(reminder_id).is_none() {
            debug!(message_id = %message.id, reminder_id = %reminder_id, "reminder no longer on message, skipping");
            return Ok(());
        }

        let claimed = self
            .messages
            .mark_reminder_fired(message.id, reminder_id)
            .await?;
        if !claimed {
            debug!(message_id = %message.id, reminder_id = %reminder_id, "reminder already fired, skipping");
            return Ok(());
        }

        let configs = self.channels.enabled(&message.user_id).await?;
        self.fan_out(
            &message,
            &configs,
            &reminder_content(&message),
            DispatchKind::Reminder,
        )
        .await?;

        Ok(())
    }

    /// One attempt per (enabled channel, addressable recipient), run
    /// concurrently with bounded parallelism. Individual failures are
    /// recorded and contained; siblings always run.
    async fn fan_out(
        &self,
        message: &Message,
        configs: &[ChannelConfig],
        content: &DeliveryContent,
        kind: DispatchKind,
    ) -> anyhow::Result<Vec<SendOutcome>> {
        let mut work = Vec::new();
        for config in configs {
            let Some(sender) = self.gateway.get(config.channel) else {
                warn!(channel = config.channel.as_str(), "no sender registered for enabled channel");
                continue;
            };
            for recipient in message.recipients.iter().filter(|r| r.is_recipient) {
                if let Some(address) = recipient.address_for(config.channel) {
                    work.push((
                        sender.clone(),
                        config.clone(),
                        recipient.member_id,
                        address.to_string(),
                    ));
                }
            }
        }

        let sends: Vec<Pin<Box<dyn Future<Output = SendOutcome> + Send>>> = work
            .into_iter()
            .map(|(sender, config, member_id, address)| {
                Box::pin(send_one(sender, config, member_id, address, content.clone()))
                    as Pin<Box<dyn Future<Output = SendOutcome> + Send>>
            })
            .collect();

        let outcomes: Vec<SendOutcome> = stream::iter(sends)
            .buffer_unordered(MAX_CONCURRENT_SENDS)
            .collect()
            .await;

        for outcome in &outcomes {
            self.messages
                .log_attempt(&DeliveryAttempt {
                    id: Uuid::new_v4(),
                    message_id: message.id,
                    member_id: outcome.member_id,
                    channel: outcome.channel,
                    kind,
                    ok: outcome.error.is_none(),
                    error: outcome.error.clone(),
                    created_at: Utc::now(),
                })
                .await?;
        }

        Ok(outcomes)
    }

    /// Re-enter the scheduled state as a fresh record: same content and
    /// snapshot, next occurrence one interval later, reminders recreated
    /// relative to the new date where they still fit.
    async fn schedule_next_occurrence(
        &self,
        message: &Message,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let Some(interval) = message.recurring_interval else {
            return Ok(());
        };
        let anchor = message.scheduled_at.unwrap_or(now);
        let Some(next_at) = schedule::next_occurrence(anchor, interval) else {
            warn!(message_id = %message.id, "next occurrence out of range, recurrence stops");
            return Ok(());
        };

        let carried = schedule::carry_reminders(&message.reminders, next_at, now);
        let next = Message {
            id: Uuid::new_v4(),
            status: MessageStatus::Scheduled,
            failure_reason: None,
            scheduled_at: Some(next_at),
            reminders: carried
                .iter()
                .map(|spec| Reminder {
                    id: Uuid::new_v4(),
                    count: spec.count,
                    unit: spec.unit,
                    fired: false,
                })
                .collect(),
            recurrence_of: Some(message.id),
            timer_handles: Vec::new(),
            sent_by: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
            ..message.clone()
        };

        self.messages.insert(&next).await?;
        let handles =
            scheduler::enqueue_message_timers(self.scheduler.as_ref(), &next, now).await?;
        self.messages.set_timer_handles(next.id, handles).await?;

        info!(
            message_id = %message.id,
            next_id = %next.id,
            next_at = %next_at,
            "recurrence scheduled"
        );
        Ok(())
    }
}

fn reminder_content(message: &Message) -> DeliveryContent {
    let when = message
        .scheduled_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "soon".to_string());
    DeliveryContent {
        subject: Some(match &message.subject {
            Some(subject) => format!("Reminder: {subject}"),
            None => format!("Reminder from {}", message.group_name),
        }),
        body: format!(
            "Reminder: a message to {} goes out {}.\n\n{}",
            message.group_name, when, message.body
        ),
    }
}
