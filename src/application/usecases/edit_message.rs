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
        models::{Message, MessageStatus},
        repositories::{GroupRepository, MessageRepository},
        schedule::{self, ScheduleInput},
    },
};

use super::schedule_message::build_reminders;

pub struct EditMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    groups: Arc<dyn GroupRepository>,
    scheduler: Arc<dyn SchedulerQueue>,
}

pub struct EditMessageRequest {
    pub user_id: Uuid,
    pub message_id: Uuid,
    pub subject: Option<String>,
    pub body: String,
    pub schedule: ScheduleInput,
    pub chosen_recipients: HashMap<Uuid, bool>,
    pub save_as_draft: bool,
}

impl EditMessageUseCase {
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

    /// Editing an unsent message cancels its pending timers and rebuilds
    /// schedule, reminders and snapshot from scratch; finalizing a draft
    /// goes through the same path.
    pub async fn execute(&self, request: EditMessageRequest) -> Result<(), DomainError> {
        let now = Utc::now();

        let message = self
            .messages
            .get(request.message_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message {}", request.message_id)))?;
        if message.user_id != request.user_id {
            return Err(DomainError::Forbidden(
                "message does not belong to user".to_string(),
            ));
        }
        if message.status.is_terminal() {
            return Err(DomainError::Forbidden(
                "message has already been sent".to_string(),
            ));
        }

        let normalized = schedule::normalize(&request.schedule, now)?;

        scheduler::cancel_timers(self.scheduler.as_ref(), &message.timer_handles).await?;

        let recipients = if request.save_as_draft {
            Vec::new()
        } else {
            let members = self.groups.members(message.group_id).await?;
            snapshot::snapshot_recipients(&members, &request.chosen_recipients)
        };

        let updated = Message {
            subject: request.subject,
            body: request.body,
            status: if request.save_as_draft {
                MessageStatus::Draft
            } else {
                MessageStatus::Scheduled
            },
            scheduled_at: normalized.scheduled_at,
            recurring_interval: normalized.recurring_interval,
            reminders: build_reminders(&normalized),
            recipients,
            timer_handles: Vec::new(),
            last_updated_by: request.user_id,
            updated_at: now,
            ..message
        };

        self.messages.update(&updated).await?;

        if !request.save_as_draft {
            let handles =
                scheduler::enqueue_message_timers(self.scheduler.as_ref(), &updated, now).await?;
            self.messages.set_timer_handles(updated.id, handles).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use std::sync::Mutex;

    use super::*;
    use crate::application::usecases::schedule_message::{
        ScheduleMessageRequest, ScheduleMessageUseCase,
    };
    use crate::domain::events::DueEvent;
    use crate::domain::models::{Group, GroupMember};
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

    async fn seeded() -> (
        Arc<InMemoryMessageRepository>,
        Arc<InMemoryGroupRepository>,
        Arc<TestScheduler>,
        Uuid,
        Uuid,
    ) {
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
        (messages, groups, scheduler, user_id, group_id)
    }

    #[tokio::test]
    async fn editing_cancels_old_timers_and_enqueues_new_ones() {
        let (messages, groups, scheduler, user_id, group_id) = seeded().await;
        let schedule_usecase =
            ScheduleMessageUseCase::new(messages.clone(), groups.clone(), scheduler.clone());
        let edit_usecase =
            EditMessageUseCase::new(messages.clone(), groups.clone(), scheduler.clone());

        let at = Utc::now() + Duration::days(5);
        let response = schedule_usecase
            .execute(ScheduleMessageRequest {
                user_id,
                group_id,
                subject: None,
                body: "original".to_string(),
                schedule: ScheduleInput {
                    is_scheduled: true,
                    scheduled_at: Some(at),
                    ..ScheduleInput::default()
                },
                chosen_recipients: HashMap::new(),
                save_as_draft: false,
            })
            .await
            .unwrap();
        let old_handles = messages
            .get(response.message_id)
            .await
            .unwrap()
            .unwrap()
            .timer_handles
            .clone();
        assert_eq!(old_handles.len(), 1);

        let new_at = Utc::now() + Duration::days(9);
        edit_usecase
            .execute(EditMessageRequest {
                user_id,
                message_id: response.message_id,
                subject: Some("changed".to_string()),
                body: "rewritten".to_string(),
                schedule: ScheduleInput {
                    is_scheduled: true,
                    scheduled_at: Some(new_at),
                    ..ScheduleInput::default()
                },
                chosen_recipients: HashMap::new(),
                save_as_draft: false,
            })
            .await
            .unwrap();

        assert_eq!(*scheduler.cancelled.lock().unwrap(), old_handles);
        let stored = messages.get(response.message_id).await.unwrap().unwrap();
        assert_eq!(stored.body, "rewritten");
        assert_eq!(stored.scheduled_at, Some(new_at));
        assert_eq!(stored.timer_handles.len(), 1);
        assert_ne!(stored.timer_handles, old_handles);
    }

    #[tokio::test]
    async fn sent_message_cannot_be_edited() {
        let (messages, groups, scheduler, user_id, group_id) = seeded().await;
        let schedule_usecase =
            ScheduleMessageUseCase::new(messages.clone(), groups.clone(), scheduler.clone());
        let edit_usecase =
            EditMessageUseCase::new(messages.clone(), groups.clone(), scheduler.clone());

        let response = schedule_usecase
            .execute(ScheduleMessageRequest {
                user_id,
                group_id,
                subject: None,
                body: "original".to_string(),
                schedule: ScheduleInput::default(),
                chosen_recipients: HashMap::new(),
                save_as_draft: false,
            })
            .await
            .unwrap();
        assert!(
            messages
                .cas_status(
                    response.message_id,
                    MessageStatus::Scheduled,
                    MessageStatus::Sent,
                    None,
                    Some(Utc::now()),
                    Some(user_id),
                )
                .await
                .unwrap()
        );

        let err = edit_usecase
            .execute(EditMessageRequest {
                user_id,
                message_id: response.message_id,
                subject: None,
                body: "too late".to_string(),
                schedule: ScheduleInput::default(),
                chosen_recipients: HashMap::new(),
                save_as_draft: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
