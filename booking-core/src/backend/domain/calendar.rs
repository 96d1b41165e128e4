//! Weekday calendar arithmetic for recurring slots.
//!
//! All dates are whole days (`NaiveDate`); time of day never takes part in a
//! comparison. Weeks start on Monday and Sunday is the last day of its week,
//! which is how the booking screens lay out a week even though weekday keys
//! number Sunday as 0.
//!
//! "Today" is an explicit input. Production code builds a calendar from the
//! current local time at the call site; tests pin it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use std::collections::BTreeSet;

use super::models::weekday::WeekdayKey;

/// Week offsets are clamped to this many weeks either side of today
pub const MAX_WEEK_OFFSET: i32 = 52 * 1000;

/// A Monday-to-Sunday week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub monday: NaiveDate,
    pub sunday: NaiveDate,
}

impl WeekRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.monday <= date && date <= self.sunday
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.monday.iter_days().take(7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayCalendar {
    today: NaiveDate,
}

impl WeekdayCalendar {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Build from a timestamp, truncated to its calendar date
    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::new(now.date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Monday of the week containing `date`
    pub fn monday_of(date: NaiveDate) -> NaiveDate {
        date.checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
            .unwrap_or(NaiveDate::MIN)
    }

    /// The week `offset` whole weeks away from this week (0 = this week).
    ///
    /// Offsets beyond `MAX_WEEK_OFFSET` are clamped.
    pub fn week_of_offset(&self, offset: i32) -> WeekRange {
        let offset = offset.clamp(-MAX_WEEK_OFFSET, MAX_WEEK_OFFSET);
        let monday = Self::monday_of(self.today) + Duration::weeks(offset as i64);
        WeekRange {
            monday,
            sunday: monday + Duration::days(6),
        }
    }

    /// Concrete date of `weekday` in the week at `offset`; Sunday is the
    /// last day of that week, not the first
    pub fn date_for_weekday(&self, offset: i32, weekday: WeekdayKey) -> NaiveDate {
        self.week_of_offset(offset).monday + Duration::days(weekday.days_from_monday() as i64)
    }

    /// Week offset containing `date`; inverse of `date_for_weekday`
    pub fn offset_of_date(&self, date: NaiveDate) -> i32 {
        let days = (Self::monday_of(date) - Self::monday_of(self.today)).num_days();
        // Both sides are Mondays, so the difference is a whole number of weeks
        (days / 7) as i32
    }

    /// Weekdays touched by `[start, end]`; empty when start > end
    pub fn weekdays_in_range(start: NaiveDate, end: NaiveDate) -> BTreeSet<WeekdayKey> {
        if start > end {
            return BTreeSet::new();
        }
        let span = (end - start).num_days();
        if span >= 6 {
            return WeekdayKey::ALL.into_iter().collect();
        }
        start
            .iter_days()
            .take(span as usize + 1)
            .map(WeekdayKey::from_date)
            .collect()
    }

    /// Number of days in `[start, end]` whose weekday is in `weekdays`.
    ///
    /// This has to agree with the server's own expansion of a recurring
    /// request; it is shown to the user as the number of slots to be created.
    pub fn count_occurrences(start: NaiveDate, end: NaiveDate, weekdays: &BTreeSet<WeekdayKey>) -> u32 {
        if start > end || weekdays.is_empty() {
            return 0;
        }
        let total_days = (end - start).num_days() + 1;
        let full_weeks = total_days / 7;
        let remainder = total_days % 7;

        // every block of seven consecutive days holds each weekday once
        let tail_start = start + Duration::days(full_weeks * 7);
        let tail = tail_start
            .iter_days()
            .take(remainder as usize)
            .filter(|d| weekdays.contains(&WeekdayKey::from_date(*d)))
            .count() as i64;

        (full_weeks * weekdays.len() as i64 + tail) as u32
    }

    /// Dates in `[start, end]` falling on one of `weekdays`, ascending
    pub fn dates_in_range(start: NaiveDate, end: NaiveDate, weekdays: &BTreeSet<WeekdayKey>) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| weekdays.contains(&WeekdayKey::from_date(*d)))
            .collect()
    }

    /// Parse an ISO date or RFC 3339 timestamp down to its date part
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        // e.g. "2024-06-03T09:00:00+07:00" -> 2024-06-03, as written
        let date_part = raw.trim().split(['T', ' ']).next()?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }

    pub fn format_date(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn brute_force_count(start: NaiveDate, end: NaiveDate, weekdays: &BTreeSet<WeekdayKey>) -> u32 {
        let mut count = 0;
        let mut current = start;
        while current <= end {
            if weekdays.contains(&WeekdayKey::from_date(current)) {
                count += 1;
            }
            current = current.succ_opt().unwrap();
        }
        count
    }

    fn set(keys: &[WeekdayKey]) -> BTreeSet<WeekdayKey> {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_week_of_offset_from_midweek_and_sunday() {
        // Wednesday 2024-06-05
        let calendar = WeekdayCalendar::new(ymd(2024, 6, 5));
        let week = calendar.week_of_offset(0);
        assert_eq!(week.monday, ymd(2024, 6, 3));
        assert_eq!(week.sunday, ymd(2024, 6, 9));

        assert_eq!(calendar.week_of_offset(-1).monday, ymd(2024, 5, 27));
        assert_eq!(calendar.week_of_offset(1).monday, ymd(2024, 6, 10));

        // A Sunday belongs to the week that started six days earlier
        let calendar = WeekdayCalendar::new(ymd(2024, 6, 9));
        assert_eq!(calendar.week_of_offset(0).monday, ymd(2024, 6, 3));
    }

    #[test]
    fn test_extreme_offsets_are_clamped() {
        let calendar = WeekdayCalendar::new(ymd(2024, 6, 5));
        assert_eq!(calendar.week_of_offset(i32::MAX), calendar.week_of_offset(MAX_WEEK_OFFSET));
        assert_eq!(calendar.week_of_offset(i32::MIN), calendar.week_of_offset(-MAX_WEEK_OFFSET));
        assert_eq!(
            calendar.date_for_weekday(i32::MAX, WeekdayKey::SUNDAY).weekday(),
            chrono::Weekday::Sun
        );
        assert_eq!(calendar.offset_of_date(calendar.week_of_offset(i32::MAX).monday), MAX_WEEK_OFFSET);
    }

    #[test]
    fn test_date_for_weekday_puts_sunday_last() {
        let calendar = WeekdayCalendar::new(ymd(2024, 6, 5));
        assert_eq!(calendar.date_for_weekday(0, WeekdayKey::MONDAY), ymd(2024, 6, 3));
        assert_eq!(calendar.date_for_weekday(0, WeekdayKey::SATURDAY), ymd(2024, 6, 8));
        assert_eq!(calendar.date_for_weekday(0, WeekdayKey::SUNDAY), ymd(2024, 6, 9));
        assert_eq!(calendar.date_for_weekday(2, WeekdayKey::SUNDAY), ymd(2024, 6, 23));
    }

    #[test]
    fn test_monday_and_sunday_for_every_offset() {
        let calendar = WeekdayCalendar::new(ymd(2025, 1, 1));
        for offset in -60..=60 {
            let monday = calendar.date_for_weekday(offset, WeekdayKey::MONDAY);
            let sunday = calendar.date_for_weekday(offset, WeekdayKey::SUNDAY);
            assert_eq!(monday.weekday(), chrono::Weekday::Mon);
            assert_eq!(sunday, monday + Duration::days(6));
            assert!(calendar.week_of_offset(offset).contains(sunday));
        }
    }

    #[test]
    fn test_offset_of_date_inverts_date_for_weekday() {
        for today in [ymd(2024, 6, 5), ymd(2024, 6, 9), ymd(2024, 12, 30), ymd(2024, 2, 29)] {
            let calendar = WeekdayCalendar::new(today);
            for offset in -52..=52 {
                for weekday in WeekdayKey::ALL {
                    let date = calendar.date_for_weekday(offset, weekday);
                    assert_eq!(calendar.offset_of_date(date), offset, "{today} {offset} {weekday}");
                }
            }
        }
    }

    #[test]
    fn test_weekdays_in_range() {
        // Fri 2024-06-07 .. Mon 2024-06-10
        let days = WeekdayCalendar::weekdays_in_range(ymd(2024, 6, 7), ymd(2024, 6, 10));
        assert_eq!(
            days,
            set(&[WeekdayKey::FRIDAY, WeekdayKey::SATURDAY, WeekdayKey::SUNDAY, WeekdayKey::MONDAY])
        );

        assert_eq!(
            WeekdayCalendar::weekdays_in_range(ymd(2024, 6, 3), ymd(2024, 6, 9)).len(),
            7
        );
        assert_eq!(
            WeekdayCalendar::weekdays_in_range(ymd(2024, 6, 3), ymd(2024, 6, 3)),
            set(&[WeekdayKey::MONDAY])
        );
        assert!(WeekdayCalendar::weekdays_in_range(ymd(2024, 6, 10), ymd(2024, 6, 3)).is_empty());
    }

    #[test]
    fn test_count_occurrences_two_mondays() {
        // 2024-06-16 is a Sunday and must not add a third occurrence
        let count = WeekdayCalendar::count_occurrences(
            ymd(2024, 6, 3),
            ymd(2024, 6, 16),
            &set(&[WeekdayKey::MONDAY]),
        );
        assert_eq!(count, 2);
    }

    #[test]
    fn test_count_occurrences_hand_computed_ranges() {
        let monday = set(&[WeekdayKey::MONDAY]);
        let weekend = set(&[WeekdayKey::SATURDAY, WeekdayKey::SUNDAY]);

        // single day
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 6, 3), ymd(2024, 6, 3), &monday), 1);
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 6, 4), ymd(2024, 6, 4), &monday), 0);
        // full week
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 6, 3), ymd(2024, 6, 9), &weekend), 2);
        // partial week remainder: Thu 06-06 .. Tue 06-18 has weekends 8/9 and 15/16
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 6, 6), ymd(2024, 6, 18), &weekend), 4);
        // across the year boundary: Sat 2024-12-28 .. Sun 2025-01-05
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 12, 28), ymd(2025, 1, 5), &weekend), 4);
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 12, 28), ymd(2025, 1, 5), &monday), 1);
        // multi-month: Mondays from 2024-01-01 to 2024-03-31 (13 of them)
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 1, 1), ymd(2024, 3, 31), &monday), 13);
        // leap February 2024 has five Thursdays (1, 8, 15, 22, 29)
        assert_eq!(
            WeekdayCalendar::count_occurrences(ymd(2024, 2, 1), ymd(2024, 2, 29), &set(&[WeekdayKey::THURSDAY])),
            5
        );
        // non-leap February 2023 has exactly four of every weekday
        assert_eq!(
            WeekdayCalendar::count_occurrences(ymd(2023, 2, 1), ymd(2023, 2, 28), &set(&[WeekdayKey::WEDNESDAY])),
            4
        );
    }

    #[test]
    fn test_count_occurrences_degenerate_inputs() {
        let monday = set(&[WeekdayKey::MONDAY]);
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 6, 10), ymd(2024, 6, 3), &monday), 0);
        assert_eq!(WeekdayCalendar::count_occurrences(ymd(2024, 6, 3), ymd(2024, 6, 30), &BTreeSet::new()), 0);
    }

    #[test]
    fn test_dates_in_range_matches_count() {
        let days = set(&[WeekdayKey::MONDAY, WeekdayKey::WEDNESDAY]);
        let dates = WeekdayCalendar::dates_in_range(ymd(2024, 6, 3), ymd(2024, 6, 16), &days);
        assert_eq!(dates, vec![ymd(2024, 6, 3), ymd(2024, 6, 5), ymd(2024, 6, 10), ymd(2024, 6, 12)]);
    }

    #[test]
    fn test_parse_date_truncates_time() {
        assert_eq!(WeekdayCalendar::parse_date("2024-06-03"), Some(ymd(2024, 6, 3)));
        assert_eq!(WeekdayCalendar::parse_date("2024-06-03T23:59:59-04:00"), Some(ymd(2024, 6, 3)));
        assert_eq!(WeekdayCalendar::parse_date("2024-06-03 08:00:00"), Some(ymd(2024, 6, 3)));
        assert_eq!(WeekdayCalendar::parse_date("03/06/2024"), None);
        assert_eq!(WeekdayCalendar::parse_date(""), None);
    }

    #[test]
    fn test_from_datetime_ignores_time_of_day() {
        let late = chrono::Utc.with_ymd_and_hms(2024, 6, 9, 23, 59, 0).unwrap();
        let calendar = WeekdayCalendar::from_datetime(&late);
        assert_eq!(calendar.today(), ymd(2024, 6, 9));
    }

    proptest! {
        #[test]
        fn prop_count_matches_brute_force(
            start_offset in 0i64..3000,
            len in 0i64..400,
            mask in 1u8..128,
        ) {
            let start = ymd(2020, 1, 1) + Duration::days(start_offset);
            let end = start + Duration::days(len);
            let weekdays: BTreeSet<WeekdayKey> = WeekdayKey::ALL
                .into_iter()
                .filter(|k| mask & (1 << k.value()) != 0)
                .collect();
            prop_assert_eq!(
                WeekdayCalendar::count_occurrences(start, end, &weekdays),
                brute_force_count(start, end, &weekdays)
            );
        }

        #[test]
        fn prop_offset_round_trip(today_offset in 0i64..3000, offset in -52i32..=52, day in 0u8..7) {
            let calendar = WeekdayCalendar::new(ymd(2020, 1, 1) + Duration::days(today_offset));
            let weekday = WeekdayKey::new(day).unwrap();
            let date = calendar.date_for_weekday(offset, weekday);
            prop_assert_eq!(calendar.offset_of_date(date), offset);
            prop_assert_eq!(WeekdayKey::from_date(date), weekday);
        }
    }
}
