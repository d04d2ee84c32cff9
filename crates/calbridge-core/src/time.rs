//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for representing a single parsed
//! timestamp (which may be either a specific instant or an all-day date), and
//! [`TimeRange`] for the optional `from`/`to` bounds of an event listing.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Represents a timestamp read from calendar text.
///
/// Calendar timestamps come in two shapes:
/// - **DateTime**: A specific instant (already normalized to UTC)
/// - **AllDay**: A date without a time-of-day component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day timestamp.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Converts to a UTC instant.
    ///
    /// For all-day dates, returns midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Returns the date portion of this timestamp.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// Optional bounds for an event listing.
///
/// Either side may be unset, in which case it imposes no constraint. Unlike a
/// half-open window, the bounds are not validated against each other: a caller
/// passing `from > to` simply gets an empty result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Lower bound; events ending strictly before it are excluded.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound; events starting strictly after it are excluded.
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// A range with no bounds on either side.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Creates a range with both bounds set.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Builder method to set the lower bound.
    #[must_use]
    pub fn with_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Builder method to set the upper bound.
    #[must_use]
    pub fn with_to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Returns true if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Decides whether an event spanning `start..end` is kept.
    ///
    /// An event is excluded if it ends strictly before `from` or starts
    /// strictly after `to`. Touching a bound keeps the event. Inverted events
    /// (`end < start`) are accepted as given.
    pub fn admits(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if let Some(from) = self.from
            && end < from
        {
            return false;
        }
        if let Some(to) = self.to
            && start > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod event_time {
        use super::*;

        #[test]
        fn allday_converts_to_midnight_utc() {
            let et = EventTime::from_date(date(2026, 2, 16));
            assert!(et.is_all_day());
            assert_eq!(et.to_utc_datetime(), utc(2026, 2, 16, 0, 0, 0));
            assert_eq!(et.date(), date(2026, 2, 16));
        }

        #[test]
        fn ordering() {
            let et1 = EventTime::from_utc(utc(2026, 2, 16, 10, 0, 0));
            let et2 = EventTime::from_utc(utc(2026, 2, 16, 11, 0, 0));
            let et3 = EventTime::from_date(date(2026, 2, 16));

            assert!(et3 < et1); // midnight < 10:00
            assert!(et1 < et2);
        }

        #[test]
        fn serde_roundtrip() {
            let et = EventTime::from_date(date(2026, 2, 16));
            let json = serde_json::to_string(&et).unwrap();
            assert!(json.contains("AllDay"));
            let parsed: EventTime = serde_json::from_str(&json).unwrap();
            assert_eq!(et, parsed);
        }
    }

    mod time_range {
        use super::*;

        #[test]
        fn unbounded_admits_everything() {
            let range = TimeRange::unbounded();
            assert!(range.is_unbounded());
            assert!(range.admits(utc(1990, 1, 1, 0, 0, 0), utc(1990, 1, 1, 1, 0, 0)));
            assert!(range.admits(utc(2090, 1, 1, 0, 0, 0), utc(2090, 1, 1, 1, 0, 0)));
        }

        #[test]
        fn from_excludes_events_that_ended_before() {
            let range = TimeRange::unbounded().with_from(utc(2026, 2, 16, 10, 30, 0));

            // [09:00, 10:00) ended before 10:30
            assert!(!range.admits(utc(2026, 2, 16, 9, 0, 0), utc(2026, 2, 16, 10, 0, 0)));
            // [11:00, 12:00) is kept, no upper bound applies
            assert!(range.admits(utc(2026, 2, 16, 11, 0, 0), utc(2026, 2, 16, 12, 0, 0)));
            assert!(range.admits(utc(2099, 1, 1, 0, 0, 0), utc(2099, 1, 1, 1, 0, 0)));
        }

        #[test]
        fn to_excludes_events_that_start_after() {
            let range = TimeRange::unbounded().with_to(utc(2026, 2, 16, 10, 0, 0));
            assert!(!range.admits(utc(2026, 2, 16, 10, 0, 1), utc(2026, 2, 16, 11, 0, 0)));
            assert!(range.admits(utc(2026, 2, 16, 9, 0, 0), utc(2026, 2, 16, 9, 30, 0)));
        }

        #[test]
        fn bounds_are_inclusive() {
            let from = utc(2026, 2, 16, 9, 0, 0);
            let to = utc(2026, 2, 16, 17, 0, 0);
            let range = TimeRange::new(from, to);

            // ends exactly at `from`
            assert!(range.admits(utc(2026, 2, 16, 8, 0, 0), from));
            // starts exactly at `to`
            assert!(range.admits(to, utc(2026, 2, 16, 18, 0, 0)));
        }

        #[test]
        fn inverted_event_is_tolerated() {
            let range = TimeRange::new(utc(2026, 2, 16, 9, 0, 0), utc(2026, 2, 16, 17, 0, 0));
            assert!(range.admits(utc(2026, 2, 16, 12, 0, 0), utc(2026, 2, 16, 11, 0, 0)));
        }
    }
}
