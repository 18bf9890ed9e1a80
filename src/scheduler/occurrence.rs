//! Pure next-occurrence calculation for a reminder.
//!
//! All math is on naive local wall-clock time; callers pass
//! `Local::now().naive_local()` as `now`. A timezone change is handled by
//! the caller recomputing from the new local time, nothing more.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::core::types::Reminder;

/// Compute the next qualifying fire time for `reminder`, strictly after
/// `now`.
///
/// The candidate starts as today's date at the reminder's time of day with
/// seconds zeroed. A candidate at or before `now` moves to tomorrow. With a
/// non-empty day filter the search walks forward one day at a time, at most
/// a full week, until the candidate's weekday qualifies; checking only
/// tomorrow would silently drop e.g. a Mon/Wed/Fri reminder consulted on a
/// Monday evening.
///
/// Returns `None` when the time string does not parse as "HH:MM" or the day
/// filter contains no valid weekday, both of which mean the reminder cannot
/// fire.
pub fn next_occurrence(reminder: &Reminder, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let time = parse_time(&reminder.time)?;

    let mut candidate = now.date().and_time(time);
    if candidate <= now {
        candidate += Duration::days(1);
    }

    if reminder.days.is_empty() {
        return Some(candidate);
    }

    // Walk forward up to 7 days; day indices outside 0..=6 never match
    for offset in 0..7 {
        let day = candidate + Duration::days(offset);
        let weekday = day.weekday().num_days_from_sunday() as u8;
        if reminder.days.contains(&weekday) {
            return Some(day);
        }
    }

    None
}

/// Parse "HH:MM" into a `NaiveTime` with seconds zeroed.
fn parse_time(time: &str) -> Option<NaiveTime> {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    parsed.with_second(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reminder(time: &str, days: Vec<u8>) -> Reminder {
        Reminder {
            id: "r-1".to_string(),
            time: time.to_string(),
            days,
            enabled: true,
            config_id: "default-1".to_string(),
        }
    }

    // 2024-01-01 is a Monday
    fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_daily_reminder_past_today_rolls_to_tomorrow() {
        let next = next_occurrence(&reminder("08:00", vec![]), monday_at(9, 0)).unwrap();
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_daily_reminder_still_ahead_fires_today() {
        let now = monday_at(7, 0);
        let next = next_occurrence(&reminder("08:00", vec![]), now).unwrap();
        assert_eq!(next, monday_at(8, 0));
        assert!(next > now);
    }

    #[test]
    fn test_daily_reminder_within_24_hours() {
        // Strictly future and at most 24h out, for any time of day
        for hour in [0, 6, 12, 18, 23] {
            let now = monday_at(hour, 30);
            let next = next_occurrence(&reminder("08:00", vec![]), now).unwrap();
            assert!(next > now);
            assert!(next - now <= Duration::hours(24));
        }
    }

    #[test]
    fn test_exact_minute_counts_as_past() {
        // candidate == now is not a future fire
        let next = next_occurrence(&reminder("09:00", vec![]), monday_at(9, 0)).unwrap();
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_day_filter_same_day_before_time() {
        // Mon/Wed/Fri reminder consulted Monday 07:00 fires Monday 08:00
        let next = next_occurrence(&reminder("08:00", vec![1, 3, 5]), monday_at(7, 0)).unwrap();
        assert_eq!(next, monday_at(8, 0));
    }

    #[test]
    fn test_day_filter_searches_past_tomorrow() {
        // Mon/Wed/Fri reminder consulted Monday 09:00 must reach Wednesday,
        // not give up because Tuesday does not qualify
        let next = next_occurrence(&reminder("08:00", vec![1, 3, 5]), monday_at(9, 0)).unwrap();
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_day_filter_full_week_wrap() {
        // Only-Monday reminder consulted Monday 09:00 waits a full week
        let next = next_occurrence(&reminder("08:00", vec![1]), monday_at(9, 0)).unwrap();
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2024, 1, 8)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_day_filter_is_earliest_qualifying() {
        // Sunday (0) and Saturday (6) from a Monday: Saturday comes first
        let next = next_occurrence(&reminder("10:00", vec![0, 6]), monday_at(9, 0)).unwrap();
        assert_eq!(next.weekday().num_days_from_sunday(), 6);
        assert_eq!(
            next.date(),
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
        );
    }

    #[test]
    fn test_invalid_day_indices_never_resolve() {
        assert_eq!(
            next_occurrence(&reminder("08:00", vec![7, 42]), monday_at(9, 0)),
            None
        );
    }

    #[test]
    fn test_malformed_time_strings() {
        for bad in ["", "8", "25:00", "12:61", "noon", "08:00:00"] {
            assert_eq!(
                next_occurrence(&reminder(bad, vec![]), monday_at(9, 0)),
                None,
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_midnight_reminder() {
        let next = next_occurrence(&reminder("00:00", vec![]), monday_at(0, 0)).unwrap();
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }
}
