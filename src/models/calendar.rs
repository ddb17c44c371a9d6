//! Calendar and time window models.
//!
//! Defines weekly availability patterns for surgeons and operating rooms,
//! concrete booked intervals, and the scheduling period.
//!
//! # Time Model
//! Wall-clock times without time zone (`chrono::NaiveDateTime`). Weekly
//! windows repeat every week on their day of week.
//!
//! # Precedence
//! An empty set of weekly windows means "always available". Otherwise an
//! interval is available iff a single window on the interval's weekday
//! covers it completely.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A concrete interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: NaiveDateTime,
    /// Interval end (exclusive).
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Duration of this window.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A recurring weekly availability window (e.g. every Monday 08:00–12:00).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyWindow {
    /// Day of week the window applies to.
    pub day: Weekday,
    /// Start time of day (inclusive).
    pub start: NaiveTime,
    /// End time of day (exclusive).
    pub end: NaiveTime,
}

impl WeeklyWindow {
    /// Creates a new weekly window.
    pub fn new(day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// Whether this window fully covers the interval.
    ///
    /// Intervals crossing midnight are never covered.
    pub fn covers(&self, window: &TimeWindow) -> bool {
        window.start.date() == window.end.date()
            && window.start.weekday() == self.day
            && window.start.time() >= self.start
            && window.end.time() <= self.end
    }
}

/// Whether a set of weekly windows makes the interval available.
///
/// No windows = always available.
pub fn weekly_covers(windows: &[WeeklyWindow], window: &TimeWindow) -> bool {
    windows.is_empty() || windows.iter().any(|w| w.covers(window))
}

/// The calendar period to schedule: [start, end) in whole days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulingPeriod {
    /// First day of the period (inclusive).
    pub start: NaiveDate,
    /// Day after the last day of the period (exclusive).
    pub end: NaiveDate,
}

impl SchedulingPeriod {
    /// Creates a new period.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Creates a single-day period.
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day + Duration::days(1),
        }
    }

    /// Whether the end lies after the start.
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Whether a date falls within the period.
    #[inline]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Whether any part of an interval falls within the period.
    pub fn touches(&self, window: &TimeWindow) -> bool {
        let start = self.start.and_time(NaiveTime::MIN);
        let end = self.end.and_time(NaiveTime::MIN);
        window.overlaps(&TimeWindow::new(start, end))
    }

    /// Days in the period, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d < self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        // 2024-01-01 is a Monday
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_time_window_overlap() {
        let a = TimeWindow::new(at(1, 8, 0), at(1, 11, 0));
        let b = TimeWindow::new(at(1, 10, 30), at(1, 12, 0));
        let c = TimeWindow::new(at(1, 11, 0), at(1, 12, 0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // half-open
        assert_eq!(a.duration(), Duration::hours(3));
        assert!(a.contains(at(1, 8, 0)));
        assert!(!a.contains(at(1, 11, 0)));
    }

    #[test]
    fn test_weekly_window_covers() {
        let monday = WeeklyWindow::new(Weekday::Mon, hm(8, 0), hm(12, 0));
        assert!(monday.covers(&TimeWindow::new(at(1, 8, 0), at(1, 11, 0))));
        assert!(monday.covers(&TimeWindow::new(at(1, 9, 0), at(1, 12, 0))));
        assert!(!monday.covers(&TimeWindow::new(at(1, 9, 30), at(1, 12, 30))));
        // Tuesday
        assert!(!monday.covers(&TimeWindow::new(at(2, 8, 0), at(2, 9, 0))));
        // Next Monday
        assert!(monday.covers(&TimeWindow::new(at(8, 8, 0), at(8, 9, 0))));
    }

    #[test]
    fn test_weekly_covers_empty_is_always_available() {
        let w = TimeWindow::new(at(3, 22, 0), at(3, 23, 0));
        assert!(weekly_covers(&[], &w));
    }

    #[test]
    fn test_period_days() {
        let p = SchedulingPeriod::new(at(1, 0, 0).date(), at(4, 0, 0).date());
        assert!(p.is_valid());
        let days: Vec<_> = p.days().collect();
        assert_eq!(days.len(), 3);
        assert!(p.contains_date(at(3, 0, 0).date()));
        assert!(!p.contains_date(at(4, 0, 0).date()));

        let single = SchedulingPeriod::single_day(at(1, 0, 0).date());
        assert_eq!(single.days().count(), 1);
        assert!(!SchedulingPeriod::new(at(2, 0, 0).date(), at(1, 0, 0).date()).is_valid());
    }

    #[test]
    fn test_period_touches() {
        let p = SchedulingPeriod::single_day(at(2, 0, 0).date());
        assert!(p.touches(&TimeWindow::new(at(2, 8, 0), at(2, 9, 0))));
        assert!(!p.touches(&TimeWindow::new(at(1, 8, 0), at(1, 9, 0))));
    }
}
