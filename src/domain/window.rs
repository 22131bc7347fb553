use chrono::{DateTime, Utc};

use crate::domain::models::ReminderUnit;

/// Below this lead time no reminder makes sense; callers drop reminders
/// entirely instead of offering sub-15-minute ones.
pub const MIN_LEAD_MILLIS: i64 = 15 * 60 * 1000;

/// Upper bound on the reminder count per unit, independent of how much
/// time actually remains.
pub fn unit_cap(unit: ReminderUnit) -> u32 {
    match unit {
        ReminderUnit::Minutes => 59,
        ReminderUnit::Hours => 24,
        ReminderUnit::Days => 15,
        ReminderUnit::Weeks => 3,
        ReminderUnit::Months => 6,
    }
}

/// Largest reminder count accepted for `unit` given the time remaining
/// before `scheduled_at`. Zero means the unit is not usable at all.
pub fn max_allowed(unit: ReminderUnit, scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let remaining = (scheduled_at - now).num_milliseconds();
    if remaining < MIN_LEAD_MILLIS {
        return 0;
    }
    let whole_units = remaining / unit.millis();
    if whole_units < 1 {
        return 0;
    }
    whole_units.min(i64::from(unit_cap(unit))) as u32
}

/// Units with at least one whole unit of lead time remaining.
pub fn legal_units(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Vec<ReminderUnit> {
    ReminderUnit::ALL
        .into_iter()
        .filter(|unit| max_allowed(*unit, scheduled_at, now) >= 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn counts_floor_to_whole_units() {
        let at = now() + Duration::days(13);
        assert_eq!(max_allowed(ReminderUnit::Days, at, now()), 13);
        assert_eq!(max_allowed(ReminderUnit::Weeks, at, now()), 1);
        assert_eq!(max_allowed(ReminderUnit::Months, at, now()), 0);
    }

    #[test]
    fn counts_are_capped_per_unit() {
        let at = now() + Duration::days(400);
        assert_eq!(max_allowed(ReminderUnit::Days, at, now()), 15);
        assert_eq!(max_allowed(ReminderUnit::Weeks, at, now()), 3);
        assert_eq!(max_allowed(ReminderUnit::Months, at, now()), 6);
        assert_eq!(max_allowed(ReminderUnit::Hours, at, now()), 24);
        assert_eq!(max_allowed(ReminderUnit::Minutes, at, now()), 59);
    }

    #[test]
    fn under_fifteen_minutes_no_unit_is_legal() {
        let at = now() + Duration::minutes(10);
        assert_eq!(max_allowed(ReminderUnit::Minutes, at, now()), 0);
        assert!(legal_units(at, now()).is_empty());
    }

    #[test]
    fn legal_units_track_remaining_window() {
        let at = now() + Duration::days(10);
        let units = legal_units(at, now());
        assert!(units.contains(&ReminderUnit::Minutes));
        assert!(units.contains(&ReminderUnit::Hours));
        assert!(units.contains(&ReminderUnit::Days));
        assert!(units.contains(&ReminderUnit::Weeks));
        assert!(!units.contains(&ReminderUnit::Months));
    }

    #[test]
    fn past_schedule_has_no_legal_units() {
        let at = now() - Duration::hours(1);
        assert!(legal_units(at, now()).is_empty());
    }
}
