//! Lookback window arithmetic.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, MetricsResult};

/// Day-aligned UTC date range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window (today, when built from the clock).
    pub end: NaiveDate,
}

impl DateRange {
    /// Build the window that ends on `today` and reaches `days_back` days back.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Validation`] if `days_back` is negative or the
    /// start date falls outside the supported calendar.
    pub fn ending_on(today: NaiveDate, days_back: i64) -> MetricsResult<Self> {
        let back = u64::try_from(days_back).map_err(|_| {
            MetricsError::Validation(format!("days_back must be >= 0, got {days_back}"))
        })?;

        let start = today.checked_sub_days(Days::new(back)).ok_or_else(|| {
            MetricsError::Validation(format!("days_back {days_back} is out of range"))
        })?;

        Ok(Self { start, end: today })
    }

    /// Build the window ending on the current UTC date.
    ///
    /// # Errors
    ///
    /// See [`DateRange::ending_on`].
    pub fn from_days_back(days_back: i64) -> MetricsResult<Self> {
        Self::ending_on(Utc::now().date_naive(), days_back)
    }

    /// Number of days between start and end (equals the lookback window).
    #[must_use]
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Every day in the window, ascending, end inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Midnight UTC at the start of the window.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Midnight UTC after the last day; exclusive upper bound for queries.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        let next = self.end.succ_opt().unwrap_or(self.end);
        next.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Unix seconds for [`DateRange::start_time`].
    #[must_use]
    pub fn start_timestamp(&self) -> i64 {
        self.start_time().timestamp()
    }

    /// Unix seconds for [`DateRange::end_time`].
    #[must_use]
    pub fn end_timestamp(&self) -> i64 {
        self.end_time().timestamp()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seven_day_window() {
        let range = DateRange::ending_on(date(2024, 6, 10), 7).unwrap();
        assert_eq!(range.start, date(2024, 6, 3));
        assert_eq!(range.end, date(2024, 6, 10));
        assert_eq!(range.len_days(), 7);
    }

    #[test]
    fn test_zero_days_is_single_day() {
        let range = DateRange::ending_on(date(2024, 6, 10), 0).unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn test_negative_days_rejected() {
        let err = DateRange::ending_on(date(2024, 6, 10), -1).unwrap_err();
        assert!(matches!(err, MetricsError::Validation(_)));
    }

    #[test]
    fn test_huge_window_rejected() {
        let err = DateRange::ending_on(date(2024, 6, 10), i64::MAX).unwrap_err();
        assert!(matches!(err, MetricsError::Validation(_)));
    }

    #[test]
    fn test_window_length_matches_days_back() {
        let today = date(2024, 3, 1);
        for days_back in 0..400 {
            let range = DateRange::ending_on(today, days_back).unwrap();
            assert!(range.start <= range.end);
            assert_eq!(range.len_days(), days_back);
            assert_eq!(range.days().count() as i64, days_back + 1);
        }
    }

    #[test]
    fn test_crosses_leap_day() {
        let range = DateRange::ending_on(date(2024, 3, 1), 1).unwrap();
        assert_eq!(range.start, date(2024, 2, 29));
    }

    #[test]
    fn test_query_bounds_are_day_aligned() {
        let range = DateRange::ending_on(date(2024, 6, 10), 7).unwrap();
        assert_eq!(range.start_time().to_rfc3339(), "2024-06-03T00:00:00+00:00");
        assert_eq!(range.end_time().to_rfc3339(), "2024-06-11T00:00:00+00:00");
        assert_eq!(range.end_timestamp() - range.start_timestamp(), 8 * 86_400);
    }

    #[test]
    fn test_contains() {
        let range = DateRange::ending_on(date(2024, 6, 10), 2).unwrap();
        assert!(range.contains(date(2024, 6, 8)));
        assert!(range.contains(date(2024, 6, 10)));
        assert!(!range.contains(date(2024, 6, 7)));
        assert!(!range.contains(date(2024, 6, 11)));
    }
}
