use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::{
    DispatchKind, RecurringInterval, RecurringUnit, Reminder, ReminderUnit,
};
use crate::domain::window;

pub const MAX_REMINDERS: usize = 6;
pub const MAX_SCHEDULE_AHEAD_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleField {
    ScheduledAt,
    RecurringInterval,
    Reminders,
}

impl ScheduleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleField::ScheduledAt => "scheduled_at",
            ScheduleField::RecurringInterval => "recurring_interval",
            ScheduleField::Reminders => "reminders",
        }
    }
}

impl fmt::Display for ScheduleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: ScheduleField,
    pub message: String,
}

impl ValidationError {
    fn new(field: ScheduleField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reminder choice as the sender expressed it, before an id is assigned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReminderSpec {
    pub count: u32,
    pub unit: ReminderUnit,
}

/// Raw scheduling choices off the compose form.
#[derive(Debug, Clone, Default)]
pub struct ScheduleInput {
    pub is_scheduled: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub is_reminders: bool,
    pub reminders: Vec<ReminderSpec>,
}

/// Self-consistent schedule: `scheduled_at = None` means send now, an empty
/// reminder list means no reminders. Every flag/field invariant holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSchedule {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub recurring_interval: Option<RecurringInterval>,
    pub reminders: Vec<ReminderSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireTime {
    pub kind: DispatchKind,
    pub at: DateTime<Utc>,
}

impl NormalizedSchedule {
    /// Concrete timestamps to enqueue: one per reminder, then the send
    /// itself (reminder leads are relative to the send moment).
    pub fn fire_times(&self, now: DateTime<Utc>) -> Vec<FireTime> {
        let send_at = self.scheduled_at.unwrap_or(now);
        let mut plan: Vec<FireTime> = self
            .reminders
            .iter()
            .map(|spec| FireTime {
                kind: DispatchKind::Reminder,
                at: reminder_fire_at(spec.count, spec.unit, send_at),
            })
            .collect();
        plan.push(FireTime {
            kind: DispatchKind::Send,
            at: send_at,
        });
        plan
    }
}

pub fn reminder_fire_at(
    count: u32,
    unit: ReminderUnit,
    send_at: DateTime<Utc>,
) -> DateTime<Utc> {
    send_at - Duration::milliseconds(i64::from(count) * unit.millis())
}

pub fn max_interval_count(unit: RecurringUnit) -> u32 {
    match unit {
        RecurringUnit::Days => 31,
        RecurringUnit::Weeks => 4,
        RecurringUnit::Months => 12,
        RecurringUnit::Years => 1,
    }
}

/// Validate and normalize raw scheduling choices.
///
/// An unscheduled message sheds its schedule and reminders but keeps any
/// recurrence request; the next occurrence then anchors at the actual send
/// instant. Reminders that no longer fit the remaining window are dropped
/// rather than rejected; reminders enabled with nothing to keep is an error.
pub fn normalize(
    input: &ScheduleInput,
    now: DateTime<Utc>,
) -> Result<NormalizedSchedule, ValidationError> {
    if !input.is_scheduled {
        return Ok(NormalizedSchedule {
            scheduled_at: None,
            recurring_interval: validated_interval(input)?,
            reminders: Vec::new(),
        });
    }

    let scheduled_at = validated_scheduled_at(input, now)?;
    let recurring_interval = validated_interval(input)?;
    let reminders = validated_reminders(input, scheduled_at, now)?;

    Ok(NormalizedSchedule {
        scheduled_at: Some(scheduled_at),
        recurring_interval,
        reminders,
    })
}

fn validated_scheduled_at(
    input: &ScheduleInput,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ValidationError> {
    let Some(at) = input.scheduled_at else {
        return Err(ValidationError::new(
            ScheduleField::ScheduledAt,
            "required when scheduling is enabled",
        ));
    };
    if at <= now {
        return Err(ValidationError::new(
            ScheduleField::ScheduledAt,
            "must be in the future",
        ));
    }
    if at > now + Duration::days(MAX_SCHEDULE_AHEAD_DAYS) {
        return Err(ValidationError::new(
            ScheduleField::ScheduledAt,
            "must be within one year",
        ));
    }
    Ok(at)
}

fn validated_interval(
    input: &ScheduleInput,
) -> Result<Option<RecurringInterval>, ValidationError> {
    if !input.is_recurring {
        return Ok(None);
    }
    let Some(interval) = input.recurring_interval else {
        return Err(ValidationError::new(
            ScheduleField::RecurringInterval,
            "required when recurrence is enabled",
        ));
    };
    if interval.count == 0 {
        return Err(ValidationError::new(
            ScheduleField::RecurringInterval,
            "count must be at least 1",
        ));
    }
    let cap = max_interval_count(interval.unit);
    if interval.count > cap {
        return Err(ValidationError::new(
            ScheduleField::RecurringInterval,
            format!("at most {} {}", cap, interval.unit.as_str()),
        ));
    }
    Ok(Some(interval))
}

fn validated_reminders(
    input: &ScheduleInput,
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<ReminderSpec>, ValidationError> {
    if !input.is_reminders {
        return Ok(Vec::new());
    }
    if input.reminders.is_empty() {
        return Err(ValidationError::new(
            ScheduleField::Reminders,
            "enabled without any entries",
        ));
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for spec in &input.reminders {
        if seen.insert((spec.count, spec.unit)) {
            unique.push(*spec);
        }
    }
    if unique.len() > MAX_REMINDERS {
        return Err(ValidationError::new(
            ScheduleField::Reminders,
            format!("at most {MAX_REMINDERS} reminders"),
        ));
    }

    // Out-of-window reminders are dropped, not rejected; an emptied list
    // simply means no reminders.
    Ok(unique
        .into_iter()
        .filter(|spec| {
            spec.count >= 1 && spec.count <= window::max_allowed(spec.unit, scheduled_at, now)
        })
        .collect())
}

/// Next occurrence of a recurring message. Months and years follow the
/// calendar; days and weeks are fixed-width.
pub fn next_occurrence(
    anchor: DateTime<Utc>,
    interval: RecurringInterval,
) -> Option<DateTime<Utc>> {
    match interval.unit {
        RecurringUnit::Days => anchor.checked_add_signed(Duration::days(i64::from(interval.count))),
        RecurringUnit::Weeks => {
            anchor.checked_add_signed(Duration::weeks(i64::from(interval.count)))
        }
        RecurringUnit::Months => anchor.checked_add_months(Months::new(interval.count)),
        RecurringUnit::Years => anchor.checked_add_months(Months::new(interval.count * 12)),
    }
}

/// Recreate a sent occurrence's reminders for the next one, keeping only
/// those that still fit the new window.
pub fn carry_reminders(
    reminders: &[Reminder],
    next_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<ReminderSpec> {
    reminders
        .iter()
        .filter(|r| r.count >= 1 && r.count <= window::max_allowed(r.unit, next_at, now))
        .map(|r| ReminderSpec {
            count: r.count,
            unit: r.unit,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn scheduled(at: DateTime<Utc>) -> ScheduleInput {
        ScheduleInput {
            is_scheduled: true,
            scheduled_at: Some(at),
            ..ScheduleInput::default()
        }
    }

    #[test]
    fn unscheduled_input_sheds_schedule_and_reminders() {
        let input = ScheduleInput {
            is_scheduled: false,
            scheduled_at: Some(now() + Duration::days(3)),
            is_reminders: true,
            reminders: vec![ReminderSpec {
                count: 1,
                unit: ReminderUnit::Days,
            }],
            ..ScheduleInput::default()
        };
        let normalized = normalize(&input, now()).unwrap();
        assert_eq!(normalized.scheduled_at, None);
        assert!(normalized.reminders.is_empty());
    }

    #[test]
    fn scheduled_at_must_be_in_the_future() {
        let err = normalize(&scheduled(now() - Duration::minutes(1)), now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::ScheduledAt);
        let err = normalize(&scheduled(now()), now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::ScheduledAt);
    }

    #[test]
    fn scheduled_at_must_be_within_a_year() {
        let err = normalize(&scheduled(now() + Duration::days(366)), now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::ScheduledAt);
    }

    #[test]
    fn missing_scheduled_at_is_rejected() {
        let input = ScheduleInput {
            is_scheduled: true,
            ..ScheduleInput::default()
        };
        let err = normalize(&input, now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::ScheduledAt);
    }

    #[test]
    fn interval_over_unit_cap_is_rejected() {
        // five weeks exceeds the four-week cap
        let mut input = scheduled(now() + Duration::days(40));
        input.is_recurring = true;
        input.recurring_interval = Some(RecurringInterval {
            count: 5,
            unit: RecurringUnit::Weeks,
        });
        let err = normalize(&input, now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::RecurringInterval);
    }

    #[test]
    fn missing_interval_is_rejected() {
        let mut input = scheduled(now() + Duration::days(5));
        input.is_recurring = true;
        let err = normalize(&input, now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::RecurringInterval);
    }

    #[test]
    fn valid_interval_survives_normalization() {
        let mut input = scheduled(now() + Duration::days(5));
        input.is_recurring = true;
        input.recurring_interval = Some(RecurringInterval {
            count: 2,
            unit: RecurringUnit::Weeks,
        });
        let normalized = normalize(&input, now()).unwrap();
        assert_eq!(
            normalized.recurring_interval,
            Some(RecurringInterval {
                count: 2,
                unit: RecurringUnit::Weeks,
            })
        );
    }

    #[test]
    fn out_of_window_reminder_is_dropped_not_rejected() {
        // ten minutes out, a one-day reminder cannot fit
        let mut input = scheduled(now() + Duration::minutes(10));
        input.is_reminders = true;
        input.reminders = vec![ReminderSpec {
            count: 1,
            unit: ReminderUnit::Days,
        }];
        let normalized = normalize(&input, now()).unwrap();
        assert!(normalized.reminders.is_empty());
    }

    #[test]
    fn reminders_enabled_with_empty_list_is_rejected() {
        let mut input = scheduled(now() + Duration::days(5));
        input.is_reminders = true;
        let err = normalize(&input, now()).unwrap_err();
        assert_eq!(err.field, ScheduleField::Reminders);
    }

    #[test]
    fn reminders_dedupe_by_count_and_unit() {
        let mut input = scheduled(now() + Duration::days(10));
        input.is_reminders = true;
        input.reminders = vec![
            ReminderSpec {
                count: 2,
                unit: ReminderUnit::Days,
            },
            ReminderSpec {
                count: 2,
                unit: ReminderUnit::Days,
            },
            ReminderSpec {
                count: 1,
                unit: ReminderUnit::Weeks,
            },
        ];
        let normalized = normalize(&input, now()).unwrap();
        assert_eq!(normalized.reminders.len(), 2);
    }

    #[test]
    fn accepted_reminders_respect_window_policy() {
        let at = now() + Duration::days(10);
        let mut input = scheduled(at);
        input.is_reminders = true;
        input.reminders = vec![
            ReminderSpec {
                count: 9,
                unit: ReminderUnit::Days,
            },
            ReminderSpec {
                count: 11,
                unit: ReminderUnit::Days,
            },
            ReminderSpec {
                count: 2,
                unit: ReminderUnit::Weeks,
            },
        ];
        let normalized = normalize(&input, now()).unwrap();
        assert_eq!(
            normalized.reminders,
            vec![ReminderSpec {
                count: 9,
                unit: ReminderUnit::Days,
            }]
        );
        for spec in &normalized.reminders {
            assert!(spec.count <= window::max_allowed(spec.unit, at, now()));
        }
    }

    #[test]
    fn fire_times_put_reminders_before_the_send() {
        let at = now() + Duration::days(10);
        let mut input = scheduled(at);
        input.is_reminders = true;
        input.reminders = vec![
            ReminderSpec {
                count: 3,
                unit: ReminderUnit::Days,
            },
            ReminderSpec {
                count: 1,
                unit: ReminderUnit::Weeks,
            },
        ];
        let normalized = normalize(&input, now()).unwrap();
        let plan = normalized.fire_times(now());
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].at, at - Duration::days(3));
        assert_eq!(plan[1].at, at - Duration::weeks(1));
        let send = plan.last().unwrap();
        assert_eq!(send.kind, DispatchKind::Send);
        assert_eq!(send.at, at);
        assert!(plan.iter().all(|f| f.at <= send.at));
    }

    #[test]
    fn immediate_send_fires_now() {
        let normalized = normalize(&ScheduleInput::default(), now()).unwrap();
        let plan = normalized.fire_times(now());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].kind, DispatchKind::Send);
        assert_eq!(plan[0].at, now());
    }

    #[test]
    fn next_occurrence_adds_fixed_width_weeks() {
        let at: DateTime<Utc> = "2026-04-01T09:00:00Z".parse().unwrap();
        let next = next_occurrence(
            at,
            RecurringInterval {
                count: 2,
                unit: RecurringUnit::Weeks,
            },
        )
        .unwrap();
        assert_eq!(next, at + Duration::weeks(2));
    }

    #[test]
    fn next_occurrence_follows_the_calendar_for_months() {
        let at: DateTime<Utc> = "2026-01-31T09:00:00Z".parse().unwrap();
        let next = next_occurrence(
            at,
            RecurringInterval {
                count: 1,
                unit: RecurringUnit::Months,
            },
        )
        .unwrap();
        // clamped to the end of February
        assert_eq!(next, "2026-02-28T09:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn carried_reminders_refit_the_new_window() {
        let reminders = vec![
            Reminder {
                id: Uuid::new_v4(),
                count: 1,
                unit: ReminderUnit::Weeks,
                fired: true,
            },
            Reminder {
                id: Uuid::new_v4(),
                count: 6,
                unit: ReminderUnit::Months,
                fired: false,
            },
        ];
        let next_at = now() + Duration::weeks(2);
        let carried = carry_reminders(&reminders, next_at, now());
        assert_eq!(
            carried,
            vec![ReminderSpec {
                count: 1,
                unit: ReminderUnit::Weeks,
            }]
        );
    }
}
