use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    application::services::{
        scheduler::{self, SchedulerQueue},
        snapshot,
    },
    domain::{
        errors::DomainError,
        models::{Message, MessageStatus, Reminder},
        repositories::{GroupRepository, MessageRepository},
        schedule::{self, NormalizedSchedule, ScheduleInput},
    },
};

pub struct ScheduleMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    groups: Arc<dyn GroupRepository>,
    scheduler: Arc<dyn SchedulerQueue>,
}

pub struct ScheduleMessageRequest {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub subject: Option<String>,
    pub body: String,
    pub schedule: ScheduleInput,
    pub chosen_recipients: HashMap<Uuid, bool>,
    pub save_as_draft: bool,
}

#[derive(Debug)]
pub struct ScheduleMessageResponse {
    pub message_id: Uuid,
}

pub(super) fn build_reminders(normalized: &NormalizedSchedule) -> Vec<Reminder> {
    normalized
        .reminders
        .iter()
        .map(|spec| Reminder {
            id: Uuid::new_v4(),
            count: spec.count,
            unit: spec.unit,
            fired: false,
        })
        .collect()
}

impl ScheduleMessageUseCase {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        groups: Arc<dyn GroupRepository>,
        scheduler: Arc<dyn SchedulerQueue>,
    ) -> Self {
        Self {
            messages,
            groups,
            scheduler,
        }
    }

    /// Nothing is persisted until the schedule normalizes cleanly; drafts
    /// are persisted without a snapshot or timers, those happen when the
    /// draft is finalized through an edit.
    pub async fn execute(
        &self,
        request: ScheduleMessageRequest,
    ) -> Result<ScheduleMessageResponse, DomainError> {
        let now = Utc::now();

        let group = self
            .groups
            .get(request.group_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("group {}", request.group_id)))?;
        if group.owner_id != request.user_id {
            return Err(DomainError::Forbidden(
                "group does not belong to user".to_string(),
            ));
        }

        let normalized = schedule::normalize(&request.schedule, now)?;

        let recipients = if request.save_as_draft {
            Vec::new()
        } else {
            let members = self.groups.members(request.group_id).await?;
            snapshot::snapshot_recipients(&members, &request.chosen_recipients)
        };

        let message = Message {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            group_id: group.id,
            group_name: group.name.clone(),
            subject: request.subject,
            body: request.body,
            status: if request.save_as_draft {
                MessageStatus::Draft
            } else {
                MessageStatus::Scheduled
            },
            failure_reason: None,
            scheduled_at: normalized.scheduled_at,
            recurring_interval: normalized.recurring_interval,
            reminders: build_reminders(&normalized),
            recipients,
            recurrence_of: None,
            timer_handles: Vec::new(),
            created_by: request.user_id,
            sent_by: None,
            last_updated_by: request.user_id,
            created_at: now,
            updated_at: now,
            sent_at: None,
        };

        self.messages.insert(&message).await?;

        if !request.save_as_draft {
            let handles =
                scheduler::enqueue_message_timers(self.scheduler.as_ref(), &message, now).await?;
            self.messages.set_timer_handles(message.id, handles).await?;
        }

        Ok(ScheduleMessageResponse {
            message_id: message.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use std::sync::Mutex;

    use super::*;
    use crate::domain::events::DueEvent;
    use crate::domain::models::{DispatchKind, Group, GroupMember, RecurringInterval, RecurringUnit, ReminderUnit};
    use crate::domain::schedule::ReminderSpec;
    use crate::infrastructure::repositories::in_memory::{
        InMemoryGroupRepository, InMemoryMessageRepository,
    };

    #[derive(Default)]
    struct TestScheduler {
        jobs: Mutex<Vec<(DateTime<Utc>, DueEvent)>>,
        cancelled: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SchedulerQueue for TestScheduler {
        async fn enqueue(
            &self,
            fire_at: DateTime<Utc>,
            event: DueEvent,
        ) -> anyhow::Result<String> {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.push((fire_at, event));
            Ok(format!("job-{}", jobs.len()))
        }

        async fn cancel(&self, handle: &str) -> anyhow::Result<()> {
            self.cancelled.lock().unwrap().push(handle.to_string());
            Ok(())
        }
    }

    struct Harness {
        usecase: ScheduleMessageUseCase,
        messages: Arc<InMemoryMessageRepository>,
        scheduler: Arc<TestScheduler>,
        user_id: Uuid,
        group_id: Uuid,
    }

    async fn harness() -> Harness {
        let messages = Arc::new(InMemoryMessageRepository::new());
        let groups = Arc::new(InMemoryGroupRepository::new());
        let scheduler = Arc::new(TestScheduler::default());

        let user_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let now = Utc::now();
        groups
            .put_group(Group {
                id: group_id,
                name: "book club".to_string(),
                owner_id: user_id,
                created_at: now,
                updated_at: now,
            })
            .await;
        groups
            .put_member(GroupMember {
                id: Uuid::new_v4(),
                group_id,
                name: "ada".to_string(),
                phone: Some("+15550001".to_string()),
                email: None,
                bridge_user_id: None,
                notes: None,
                default_recipient: true,
            })
            .await;

        let usecase =
            ScheduleMessageUseCase::new(messages.clone(), groups.clone(), scheduler.clone());
        Harness {
            usecase,
            messages,
            scheduler,
            user_id,
            group_id,
        }
    }

    fn request(h: &Harness, schedule: ScheduleInput) -> ScheduleMessageRequest {
        ScheduleMessageRequest {
            user_id: h.user_id,
            group_id: h.group_id,
            subject: None,
            body: "see you thursday".to_string(),
            schedule,
            chosen_recipients: HashMap::new(),
            save_as_draft: false,
        }
    }

    #[tokio::test]
    async fn scheduling_persists_and_enqueues_reminder_and_send_timers() {
        let h = harness().await;
        let at = Utc::now() + Duration::days(10);
        let response = h
            .usecase
            .execute(request(
                &h,
                ScheduleInput {
                    is_scheduled: true,
                    scheduled_at: Some(at),
                    is_reminders: true,
                    reminders: vec![ReminderSpec {
                        count: 2,
                        unit: ReminderUnit::Days,
                    }],
                    ..ScheduleInput::default()
                },
            ))
            .await
            .unwrap();

        let stored = h.messages.get(response.message_id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Scheduled);
        assert_eq!(stored.scheduled_at, Some(at));
        assert_eq!(stored.reminders.len(), 1);
        assert_eq!(stored.recipients.len(), 1);
        assert_eq!(stored.timer_handles.len(), 2);

        let jobs = h.scheduler.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].1.kind, DispatchKind::Reminder);
        assert_eq!(jobs[0].0, at - Duration::days(2));
        assert_eq!(jobs[1].1.kind, DispatchKind::Send);
        assert_eq!(jobs[1].0, at);
    }

    #[tokio::test]
    async fn invalid_schedule_persists_nothing() {
        let h = harness().await;
        let err = h
            .usecase
            .execute(request(
                &h,
                ScheduleInput {
                    is_scheduled: true,
                    scheduled_at: Some(Utc::now() - Duration::hours(1)),
                    ..ScheduleInput::default()
                },
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        let (messages, _) = h.messages.list_by_user(h.user_id, None, None).await.unwrap();
        assert!(messages.is_empty());
        assert!(h.scheduler.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn interval_over_cap_is_rejected() {
        let h = harness().await;
        let err = h
            .usecase
            .execute(request(
                &h,
                ScheduleInput {
                    is_scheduled: true,
                    scheduled_at: Some(Utc::now() + Duration::days(40)),
                    is_recurring: true,
                    recurring_interval: Some(RecurringInterval {
                        count: 5,
                        unit: RecurringUnit::Weeks,
                    }),
                    ..ScheduleInput::default()
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn immediate_send_enqueues_a_single_job() {
        let h = harness().await;
        let before = Utc::now();
        h.usecase
            .execute(request(&h, ScheduleInput::default()))
            .await
            .unwrap();

        let jobs = h.scheduler.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].1.kind, DispatchKind::Send);
        assert!(jobs[0].0 >= before && jobs[0].0 <= Utc::now());
    }

    #[tokio::test]
    async fn draft_skips_snapshot_and_timers() {
        let h = harness().await;
        let mut req = request(&h, ScheduleInput::default());
        req.save_as_draft = true;
        let response = h.usecase.execute(req).await.unwrap();

        let stored = h.messages.get(response.message_id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Draft);
        assert!(stored.recipients.is_empty());
        assert!(stored.timer_handles.is_empty());
        assert!(h.scheduler.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_group_is_forbidden() {
        let h = harness().await;
        let mut req = request(&h, ScheduleInput::default());
        req.user_id = Uuid::new_v4();
        let err = h.usecase.execute(req).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
