use chrono::{DateTime, NaiveDate, Utc};
use habits_types::Periodicity;

/// Longest run of check-offs where each one lands within the habit's grace
/// window of the previous one. Time of day is ignored and several
/// check-offs on one calendar day count once. Returns 0 for no events.
pub fn longest_streak(events: &[DateTime<Utc>], periodicity: Periodicity) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in distinct_days(events) {
        current = match previous {
            // Days are distinct, so the gap is at least 1: for daily habits
            // this only accepts the next calendar day.
            Some(prev) if (day - prev).num_days() <= periodicity.grace_days() => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }

    longest
}

/// A habit is broken when it has never been checked off, or when the last
/// check-off is older than the grace window as seen from `today`.
pub fn is_broken(events: &[DateTime<Utc>], periodicity: Periodicity, today: NaiveDate) -> bool {
    match events.iter().map(DateTime::date_naive).max() {
        None => true,
        Some(last) => (today - last).num_days() > periodicity.grace_days(),
    }
}

fn distinct_days(events: &[DateTime<Utc>]) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = events.iter().map(DateTime::date_naive).collect();
    days.sort_unstable();
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap() + Duration::days(offset)
    }

    fn today(offset: i64) -> NaiveDate {
        day(offset).date_naive()
    }

    #[test]
    fn empty_history() {
        assert_eq!(longest_streak(&[], Periodicity::Daily), 0);
        assert_eq!(longest_streak(&[], Periodicity::Weekly), 0);
        assert!(is_broken(&[], Periodicity::Daily, today(0)));
        assert!(is_broken(&[], Periodicity::Weekly, today(0)));
    }

    #[test]
    fn daily_consecutive_days() {
        let events = [day(0), day(1), day(2)];
        assert_eq!(longest_streak(&events, Periodicity::Daily), 3);
    }

    #[test]
    fn daily_gap_resets() {
        let events = [day(0), day(3)];
        assert_eq!(longest_streak(&events, Periodicity::Daily), 1);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let events = [day(2), day(0), day(1), day(10)];
        assert_eq!(longest_streak(&events, Periodicity::Daily), 3);
    }

    #[test]
    fn time_of_day_is_ignored() {
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 2, 0, 1, 0).unwrap();
        assert_eq!(longest_streak(&[late, early], Periodicity::Daily), 2);
    }

    #[test]
    fn same_day_repeats_count_once() {
        let events = [day(0), day(1), day(1) + Duration::hours(5), day(2)];
        assert_eq!(longest_streak(&events, Periodicity::Daily), 3);

        let events = [day(0), day(0), day(0)];
        assert_eq!(longest_streak(&events, Periodicity::Weekly), 1);
    }

    #[test]
    fn weekly_window_is_inclusive() {
        assert_eq!(longest_streak(&[day(0), day(6)], Periodicity::Weekly), 2);
        assert_eq!(longest_streak(&[day(0), day(7)], Periodicity::Weekly), 2);
        assert_eq!(longest_streak(&[day(0), day(8)], Periodicity::Weekly), 1);
    }

    #[test]
    fn longest_run_wins_over_latest_run() {
        let events = [day(0), day(1), day(2), day(3), day(10), day(11)];
        assert_eq!(longest_streak(&events, Periodicity::Daily), 4);
    }

    #[test]
    fn daily_broken_after_two_days() {
        let events = [day(0)];
        assert!(!is_broken(&events, Periodicity::Daily, today(0)));
        assert!(!is_broken(&events, Periodicity::Daily, today(1)));
        assert!(is_broken(&events, Periodicity::Daily, today(2)));
    }

    #[test]
    fn weekly_broken_after_eight_days() {
        let events = [day(0), day(-20)];
        assert!(!is_broken(&events, Periodicity::Weekly, today(7)));
        assert!(is_broken(&events, Periodicity::Weekly, today(8)));
    }

    #[test]
    fn broken_uses_latest_event_regardless_of_order() {
        let events = [day(5), day(0), day(3)];
        assert!(!is_broken(&events, Periodicity::Daily, today(6)));
    }
}
