//! Recurring reminder expansion.
//!
//! Turns a set of times-of-day plus a day window into concrete occurrence
//! timestamps, one per (time, day) pair. The caller supplies `now`, so the
//! expansion is exactly reproducible under a fixed clock.

use chrono::{DateTime, Days, NaiveTime, Utc};

/// Today plus the next 30 days.
pub const DEFAULT_WINDOW_DAYS: u32 = 31;

/// Parse requested times-of-day in `HH:MM` 24-hour format.
///
/// All-or-nothing: one malformed entry fails the whole request, before any
/// record is created.
pub fn parse_times(times: &[String]) -> Result<Vec<NaiveTime>, String> {
    if times.is_empty() {
        return Err("at least one time is required".to_string());
    }
    times
        .iter()
        .map(|raw| {
            NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .map_err(|_| format!("invalid time '{}': expected HH:MM in 24-hour format", raw))
        })
        .collect()
}

/// Expand `times` over `window_days` consecutive days starting at `now`'s
/// date. Occurrences are emitted per time, in day order, so the first
/// element is the earliest time on day 0 and the last is the latest time on
/// the final day.
pub fn expand_occurrences(
    times: &[NaiveTime],
    now: DateTime<Utc>,
    window_days: u32,
) -> Vec<DateTime<Utc>> {
    let start = now.date_naive();
    let mut occurrences = Vec::with_capacity(times.len() * window_days as usize);
    for &time in times {
        for offset in 0..window_days {
            let day = start + Days::new(u64::from(offset));
            occurrences.push(day.and_time(time).and_utc());
        }
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn times(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_times_over_31_days_yield_62_occurrences() {
        let parsed = parse_times(&times(&["08:00", "20:00"])).unwrap();
        let occurrences = expand_occurrences(&parsed, fixed_now(), DEFAULT_WINDOW_DAYS);

        assert_eq!(occurrences.len(), 62);
        assert_eq!(
            occurrences.first().unwrap(),
            &Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
        );
        assert_eq!(
            occurrences.last().unwrap(),
            &Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_expansion_is_deterministic_for_fixed_clock() {
        let parsed = parse_times(&times(&["06:30", "12:00", "22:15"])).unwrap();
        let a = expand_occurrences(&parsed, fixed_now(), DEFAULT_WINDOW_DAYS);
        let b = expand_occurrences(&parsed, fixed_now(), DEFAULT_WINDOW_DAYS);
        assert_eq!(a, b);
        assert_eq!(a.len(), 93);
    }

    #[test]
    fn test_malformed_time_rejects_whole_request() {
        assert!(parse_times(&times(&["08:00", "25:99"])).is_err());
        assert!(parse_times(&times(&["24:00"])).is_err());
        assert!(parse_times(&times(&["08:60"])).is_err());
        assert!(parse_times(&times(&["8am"])).is_err());
        assert!(parse_times(&times(&["08:00:00"])).is_err());
    }

    #[test]
    fn test_empty_times_rejected() {
        assert!(parse_times(&[]).is_err());
    }

    #[test]
    fn test_expansion_crosses_month_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 2, 28, 12, 0, 0).unwrap();
        let parsed = parse_times(&times(&["09:00"])).unwrap();
        let occurrences = expand_occurrences(&parsed, now, 3);

        // 2024 is a leap year.
        assert_eq!(
            occurrences,
            vec![
                Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            ]
        );
    }
}
