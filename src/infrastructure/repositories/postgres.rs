use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::domain::{
    models::{
        ChannelConfig, ChannelConfigStatus, ChannelType, DeliveryAttempt, DispatchKind, Group,
        GroupMember, Message, MessageStatus, RecipientSnapshot, RecurringInterval, RecurringUnit,
        Reminder, ReminderUnit,
    },
    repositories::{ChannelConfigRepository, GroupRepository, MessageRepository},
};

pub type PgPool = Pool<Postgres>;

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    async fn reminders_for(&self, message_ids: &[Uuid]) -> anyhow::Result<Vec<(Uuid, Reminder)>> {
        let rows = sqlx::query(
            r#"
            SELECT id, message_id, count, unit, fired
            FROM reminders
            WHERE message_id = ANY($1)
            ORDER BY count * CASE unit
                WHEN 'minutes' THEN 1
                WHEN 'hours' THEN 60
                WHEN 'days' THEN 1440
                WHEN 'weeks' THEN 10080
                ELSE 43200
            END
            "#,
        )
        .bind(message_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let unit_str: String = row.try_get("unit")?;
                let unit = ReminderUnit::from_str(&unit_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown reminder unit {unit_str}"))?;
                Ok((
                    row.try_get("message_id")?,
                    Reminder {
                        id: row.try_get("id")?,
                        count: row.try_get::<i32, _>("count")? as u32,
                        unit,
                        fired: row.try_get("fired")?,
                    },
                ))
            })
            .collect()
    }

    async fn snapshots_for(
        &self,
        message_ids: &[Uuid],
    ) -> anyhow::Result<Vec<(Uuid, RecipientSnapshot)>> {
        let rows = sqlx::query_as::<_, RecipientSnapshotRecord>(
            r#"
            SELECT message_id, member_id, name, phone, email, bridge_user_id, notes, is_recipient
            FROM recipient_snapshots
            WHERE message_id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(message_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|record| (record.message_id, record.into()))
            .collect())
    }

    async fn assemble(&self, rows: Vec<sqlx::postgres::PgRow>) -> anyhow::Result<Vec<Message>> {
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<_, _>>()?;
        let mut messages: Vec<Message> = rows
            .into_iter()
            .map(Message::try_from)
            .collect::<Result<_, _>>()?;

        if !ids.is_empty() {
            let reminders = self.reminders_for(&ids).await?;
            let snapshots = self.snapshots_for(&ids).await?;
            for message in &mut messages {
                message.reminders = reminders
                    .iter()
                    .filter(|(id, _)| *id == message.id)
                    .map(|(_, r)| r.clone())
                    .collect();
                message.recipients = snapshots
                    .iter()
                    .filter(|(id, _)| *id == message.id)
                    .map(|(_, s)| s.clone())
                    .collect();
            }
        }

        Ok(messages)
    }

    async fn write_children(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        message: &Message,
    ) -> anyhow::Result<()> {
        for reminder in &message.reminders {
            sqlx::query(
                r#"
                INSERT INTO reminders (id, message_id, count, unit, fired)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(reminder.id)
            .bind(message.id)
            .bind(reminder.count as i32)
            .bind(reminder.unit.as_str())
            .bind(reminder.fired)
            .execute(&mut **tx)
            .await?;
        }

        for snapshot in &message.recipients {
            sqlx::query(
                r#"
                INSERT INTO recipient_snapshots (
                    message_id, member_id, name, phone, email, bridge_user_id, notes, is_recipient
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(message.id)
            .bind(snapshot.member_id)
            .bind(&snapshot.name)
            .bind(&snapshot.phone)
            .bind(&snapshot.email)
            .bind(&snapshot.bridge_user_id)
            .bind(&snapshot.notes)
            .bind(snapshot.is_recipient)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, message: &Message) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, user_id, group_id, group_name, subject, body, status, failure_reason,
                scheduled_at, recurring_count, recurring_unit, recurrence_of, timer_handles,
                created_by, sent_by, last_updated_by, created_at, updated_at, sent_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)
            "#,
        )
        .bind(message.id)
        .bind(message.user_id)
        .bind(message.group_id)
        .bind(&message.group_name)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.status.as_str())
        .bind(&message.failure_reason)
        .bind(message.scheduled_at)
        .bind(message.recurring_interval.map(|i| i.count as i32))
        .bind(message.recurring_interval.map(|i| i.unit.as_str()))
        .bind(message.recurrence_of)
        .bind(&message.timer_handles)
        .bind(message.created_by)
        .bind(message.sent_by)
        .bind(message.last_updated_by)
        .bind(message.created_at)
        .bind(message.updated_at)
        .bind(message.sent_at)
        .execute(&mut *tx)
        .await?;

        Self::write_children(&mut tx, message).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, message: &Message) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE messages
            SET group_name = $2,
                subject = $3,
                body = $4,
                status = $5,
                failure_reason = $6,
                scheduled_at = $7,
                recurring_count = $8,
                recurring_unit = $9,
                timer_handles = $10,
                last_updated_by = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(message.id)
        .bind(&message.group_name)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.status.as_str())
        .bind(&message.failure_reason)
        .bind(message.scheduled_at)
        .bind(message.recurring_interval.map(|i| i.count as i32))
        .bind(message.recurring_interval.map(|i| i.unit.as_str()))
        .bind(&message.timer_handles)
        .bind(message.last_updated_by)
        .bind(message.updated_at)
        .execute(&mut *tx)
        .await?;

        // edits replace reminders and the snapshot wholesale
        sqlx::query("DELETE FROM reminders WHERE message_id = $1")
            .bind(message.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipient_snapshots WHERE message_id = $1")
            .bind(message.id)
            .execute(&mut *tx)
            .await?;
        Self::write_children(&mut tx, message).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, message_id: Uuid) -> anyhow::Result<Option<Message>> {
        let row = sqlx::query(r#"SELECT * FROM messages WHERE id = $1"#)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn delete(&self, message_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<Message>, bool)> {
        let limit = limit.unwrap_or(50).min(200) as i32;
        let offset = offset.unwrap_or(0) as i32;

        // one extra row to detect another page
        let rows = sqlx::query(
            r#"
            SELECT *
            FROM messages
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit + 1)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let has_more = rows.len() > limit as usize;
        let rows: Vec<_> = rows.into_iter().take(limit as usize).collect();
        Ok((self.assemble(rows).await?, has_more))
    }

    async fn cas_status(
        &self,
        message_id: Uuid,
        expected: MessageStatus,
        next: MessageStatus,
        failure_reason: Option<String>,
        sent_at: Option<DateTime<Utc>>,
        sent_by: Option<Uuid>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET status = $3,
                failure_reason = $4,
                sent_at = COALESCE($5, sent_at),
                sent_by = COALESCE($6, sent_by),
                updated_at = $7
            WHERE id = $1
              AND status = $2
            "#,
        )
        .bind(message_id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(failure_reason)
        .bind(sent_at)
        .bind(sent_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_reminder_fired(
        &self,
        message_id: Uuid,
        reminder_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reminders
            SET fired = TRUE
            WHERE id = $1
              AND message_id = $2
              AND fired = FALSE
            "#,
        )
        .bind(reminder_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_timer_handles(
        &self,
        message_id: Uuid,
        handles: Vec<String>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE messages SET timer_handles = $2, updated_at = $3 WHERE id = $1")
            .bind(message_id)
            .bind(&handles)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn log_attempt(&self, attempt: &DeliveryAttempt) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_attempts (
                id, message_id, member_id, channel, kind, ok, error, created_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.message_id)
        .bind(attempt.member_id)
        .bind(attempt.channel.as_str())
        .bind(attempt.kind.as_str())
        .bind(attempt.ok)
        .bind(&attempt.error)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attempts(&self, message_id: Uuid) -> anyhow::Result<Vec<DeliveryAttempt>> {
        let rows = sqlx::query(
            r#"
            SELECT id, message_id, member_id, channel, kind, ok, error, created_at
            FROM delivery_attempts
            WHERE message_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let channel_str: String = row.try_get("channel")?;
                let channel = ChannelType::from_str(&channel_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown channel {channel_str}"))?;
                let kind_str: String = row.try_get("kind")?;
                let kind = DispatchKind::from_str(&kind_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown attempt kind {kind_str}"))?;

                Ok(DeliveryAttempt {
                    id: row.try_get("id")?,
                    message_id: row.try_get("message_id")?,
                    member_id: row.try_get("member_id")?,
                    channel,
                    kind,
                    ok: row.try_get("ok")?,
                    error: row.try_get("error")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn get(&self, group_id: Uuid) -> anyhow::Result<Option<Group>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            r#"SELECT id, name, owner_id, created_at, updated_at FROM groups WHERE id = $1"#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(Group::from))
    }

    async fn members(&self, group_id: Uuid) -> anyhow::Result<Vec<GroupMember>> {
        let rows = sqlx::query_as::<_, GroupMemberRecord>(
            r#"
            SELECT id, group_id, name, phone, email, bridge_user_id, notes, default_recipient
            FROM group_members
            WHERE group_id = $1
            ORDER BY name
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GroupMember::from).collect())
    }
}

#[derive(Clone)]
pub struct PostgresChannelConfigRepository {
    pool: PgPool,
}

impl PostgresChannelConfigRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ChannelConfigRepository for PostgresChannelConfigRepository {
    async fn enabled(&self, user_id: &Uuid) -> anyhow::Result<Vec<ChannelConfig>> {
        let rows = sqlx::query_as::<_, ChannelConfigRecord>(
            r#"
            SELECT id, user_id, channel, credential, sender_id, status, created_at, updated_at
            FROM channel_configs
            WHERE user_id = $1
              AND status = 'active'
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|record| record.try_into()).collect()
    }
}

#[derive(FromRow)]
struct GroupRecord {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GroupRecord> for Group {
    fn from(value: GroupRecord) -> Self {
        Self {
            id: value.id,
            name: value.name,
            owner_id: value.owner_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(FromRow)]
struct GroupMemberRecord {
    id: Uuid,
    group_id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    bridge_user_id: Option<String>,
    notes: Option<String>,
    default_recipient: bool,
}

impl From<GroupMemberRecord> for GroupMember {
    fn from(value: GroupMemberRecord) -> Self {
        Self {
            id: value.id,
            group_id: value.group_id,
            name: value.name,
            phone: value.phone,
            email: value.email,
            bridge_user_id: value.bridge_user_id,
            notes: value.notes,
            default_recipient: value.default_recipient,
        }
    }
}

#[derive(FromRow)]
struct RecipientSnapshotRecord {
    message_id: Uuid,
    member_id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    bridge_user_id: Option<String>,
    notes: Option<String>,
    is_recipient: bool,
}

impl From<RecipientSnapshotRecord> for RecipientSnapshot {
    fn from(value: RecipientSnapshotRecord) -> Self {
        Self {
            member_id: value.member_id,
            name: value.name,
            phone: value.phone,
            email: value.email,
            bridge_user_id: value.bridge_user_id,
            notes: value.notes,
            is_recipient: value.is_recipient,
        }
    }
}

#[derive(FromRow)]
struct ChannelConfigRecord {
    id: Uuid,
    user_id: Uuid,
    channel: String,
    credential: String,
    sender_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ChannelConfigRecord> for ChannelConfig {
    type Error = anyhow::Error;

    fn try_from(value: ChannelConfigRecord) -> Result<Self, Self::Error> {
        let channel = ChannelType::from_str(&value.channel)
            .ok_or_else(|| anyhow::anyhow!("unknown channel {}", value.channel))?;
        let status = match value.status.as_str() {
            "active" => ChannelConfigStatus::Active,
            "inactive" => ChannelConfigStatus::Inactive,
            other => anyhow::bail!("unknown channel config status {other}"),
        };
        Ok(Self {
            id: value.id,
            user_id: value.user_id,
            channel,
            credential: value.credential,
            sender_id: value.sender_id,
            status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl TryFrom<sqlx::postgres::PgRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: sqlx::postgres::PgRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        let status = MessageStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown message status {status_str}"))?;

        let recurring_count: Option<i32> = row.try_get("recurring_count")?;
        let recurring_unit: Option<String> = row.try_get("recurring_unit")?;
        let recurring_interval = match (recurring_count, recurring_unit) {
            (Some(count), Some(unit_str)) => {
                let unit = RecurringUnit::from_str(&unit_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown recurring unit {unit_str}"))?;
                Some(RecurringInterval {
                    count: count as u32,
                    unit,
                })
            }
            _ => None,
        };

        Ok(Message {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            group_id: row.try_get("group_id")?,
            group_name: row.try_get("group_name")?,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            status,
            failure_reason: row.try_get("failure_reason")?,
            scheduled_at: row.try_get("scheduled_at")?,
            recurring_interval,
            reminders: Vec::new(),
            recipients: Vec::new(),
            recurrence_of: row.try_get("recurrence_of")?,
            timer_handles: row.try_get("timer_handles")?,
            created_by: row.try_get("created_by")?,
            sent_by: row.try_get("sent_by")?,
            last_updated_by: row.try_get("last_updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            sent_at: row.try_get("sent_at")?,
        })
    }
}
