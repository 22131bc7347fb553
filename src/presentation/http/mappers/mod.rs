use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    domain::models::{DeliveryAttempt, Message},
    domain::schedule::ScheduleInput,
    presentation::http::{
        requests::ComposeMessageRequestDto,
        responses::{DeliveryAttemptDto, MessageDto, RecipientSnapshotDto, ReminderDto},
    },
};

pub fn map_message(message: &Message) -> MessageDto {
    MessageDto {
        id: message.id,
        group_id: message.group_id,
        group_name: message.group_name.clone(),
        subject: message.subject.clone(),
        body: message.body.clone(),
        status: message.status.into(),
        failure_reason: message.failure_reason.clone(),
        scheduled_at: message.scheduled_at.map(|at| at.to_rfc3339()),
        recurring_interval: message.recurring_interval.map(Into::into),
        reminders: message
            .reminders
            .iter()
            .map(|r| ReminderDto {
                count: r.count,
                unit: r.unit.into(),
                fired: r.fired,
            })
            .collect(),
        recipients: message
            .recipients
            .iter()
            .map(|s| RecipientSnapshotDto {
                member_id: s.member_id,
                name: s.name.clone(),
                phone: s.phone.clone(),
                email: s.email.clone(),
                bridge_user_id: s.bridge_user_id.clone(),
                notes: s.notes.clone(),
                is_recipient: s.is_recipient,
            })
            .collect(),
        recurrence_of: message.recurrence_of,
        created_at: message.created_at.to_rfc3339(),
        updated_at: message.updated_at.to_rfc3339(),
        sent_at: message.sent_at.map(|at| at.to_rfc3339()),
    }
}

pub fn map_attempt(attempt: &DeliveryAttempt) -> DeliveryAttemptDto {
    DeliveryAttemptDto {
        id: attempt.id,
        member_id: attempt.member_id,
        channel: attempt.channel.into(),
        kind: attempt.kind.into(),
        ok: attempt.ok,
        error: attempt.error.clone(),
        created_at: attempt.created_at.to_rfc3339(),
    }
}

pub fn map_schedule_input(request: &ComposeMessageRequestDto) -> ScheduleInput {
    ScheduleInput {
        is_scheduled: request.is_scheduled,
        scheduled_at: request.scheduled_at,
        is_recurring: request.is_recurring,
        recurring_interval: request.recurring_interval.map(Into::into),
        is_reminders: request.is_reminders,
        reminders: request.reminders.iter().map(|r| (*r).into()).collect(),
    }
}

pub fn map_recipient_choices(request: &ComposeMessageRequestDto) -> HashMap<Uuid, bool> {
    request
        .recipients
        .iter()
        .map(|choice| (choice.member_id, choice.included))
        .collect()
}
