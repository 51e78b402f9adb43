//! Time block and recurring-availability models.
//!
//! A time block is a named weekly availability template. Each entry pairs a
//! repetition rate with a within-day window; expanding a template against a
//! concrete date yields the ordered open windows applicable that day.
//!
//! # Time Model
//! Windows are time-of-day pairs (`NaiveTime`), strictly `start < end`, and
//! never span midnight. Expansion is pure: the same date always yields the
//! same windows.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved property key flagging a collection's default template.
pub const DEFAULT_FLAG_KEY: &str = "default";

/// Reserved property value flagging a collection's default template.
pub const DEFAULT_FLAG_VALUE: &str = "true";

/// A within-day time interval [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start (inclusive).
    pub start: NaiveTime,
    /// Window end (exclusive).
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Creates a new window.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Window length in whole minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether two windows overlap (shared boundary does not count).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// How often a time-block entry repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    /// Every day of the week.
    Daily,
    /// Monday through Friday.
    Weekdays,
    /// One specific day of the week.
    Weekly(Weekday),
}

impl Recurrence {
    /// Whether this recurrence applies on the given date.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Recurrence::Daily => true,
            Recurrence::Weekdays => date.weekday().number_from_monday() <= 5,
            Recurrence::Weekly(day) => date.weekday() == *day,
        }
    }
}

/// One recurring availability window within a time block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Repetition rate.
    pub recurrence: Recurrence,
    /// Open window on matching days.
    pub window: TimeWindow,
}

/// A named recurring-availability template.
///
/// Multiple entries may apply on the same day (e.g. a morning and an
/// afternoon window); they are treated as independent disjoint windows
/// unless they overlap, in which case expansion returns their union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBlock {
    /// Display name.
    pub name: String,
    /// Free-form properties. `DEFAULT_FLAG_KEY` = `DEFAULT_FLAG_VALUE`
    /// marks the collection default.
    pub attributes: HashMap<String, String>,
    /// Recurring entries, in insertion order.
    pub entries: Vec<BlockEntry>,
}

impl TimeBlock {
    /// Creates an empty template.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Adds a recurring entry.
    pub fn with_entry(mut self, recurrence: Recurrence, start: NaiveTime, end: NaiveTime) -> Self {
        self.entries.push(BlockEntry {
            recurrence,
            window: TimeWindow::new(start, end),
        });
        self
    }

    /// Adds a free-form property.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Flags this template as the collection default.
    pub fn as_default(self) -> Self {
        self.with_attribute(DEFAULT_FLAG_KEY, DEFAULT_FLAG_VALUE)
    }

    /// Whether this template carries the default flag.
    pub fn is_default(&self) -> bool {
        self.attributes.get(DEFAULT_FLAG_KEY).map(String::as_str) == Some(DEFAULT_FLAG_VALUE)
    }

    /// Expands this template against a concrete date.
    ///
    /// Returns the ordered, non-overlapping open windows on that date:
    /// every entry whose recurrence matches the date's weekday contributes
    /// its window, sorted by start; overlapping windows are merged into
    /// their union. An empty result means the resource is unavailable that
    /// day and the caller must skip to the next day.
    pub fn windows_on(&self, date: NaiveDate) -> Vec<TimeWindow> {
        let mut windows: Vec<TimeWindow> = self
            .entries
            .iter()
            .filter(|e| e.recurrence.matches(date))
            .map(|e| e.window)
            .collect();
        windows.sort_by_key(|w| (w.start, w.end));

        let mut merged: Vec<TimeWindow> = Vec::with_capacity(windows.len());
        for w in windows {
            match merged.last_mut() {
                // Strict overlap only: back-to-back windows stay separate.
                Some(last) if w.start < last.end => {
                    if w.end > last.end {
                        last.end = w.end;
                    }
                }
                _ => merged.push(w),
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() // a Monday
    }

    #[test]
    fn test_window_duration_and_overlap() {
        let w = TimeWindow::new(t(8, 0), t(12, 0));
        assert_eq!(w.duration_minutes(), 240);

        let afternoon = TimeWindow::new(t(13, 0), t(17, 0));
        assert!(!w.overlaps(&afternoon));

        let touching = TimeWindow::new(t(12, 0), t(13, 0));
        assert!(!w.overlaps(&touching)); // shared boundary

        let overlapping = TimeWindow::new(t(11, 0), t(14, 0));
        assert!(w.overlaps(&overlapping));
    }

    #[test]
    fn test_recurrence_matching() {
        let mon = monday();
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();

        assert!(Recurrence::Daily.matches(mon));
        assert!(Recurrence::Daily.matches(sat));
        assert!(Recurrence::Weekdays.matches(mon));
        assert!(!Recurrence::Weekdays.matches(sat));
        assert!(Recurrence::Weekly(Weekday::Mon).matches(mon));
        assert!(!Recurrence::Weekly(Weekday::Tue).matches(mon));
    }

    #[test]
    fn test_windows_on_selects_and_sorts() {
        let block = TimeBlock::new("Office Hours")
            .with_entry(Recurrence::Weekdays, t(13, 0), t(17, 0))
            .with_entry(Recurrence::Weekdays, t(8, 0), t(12, 0))
            .with_entry(Recurrence::Weekly(Weekday::Sat), t(10, 0), t(12, 0));

        let windows = block.windows_on(monday());
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, t(8, 0));
        assert_eq!(windows[1].start, t(13, 0));
    }

    #[test]
    fn test_windows_on_empty_day() {
        let block = TimeBlock::new("Weekdays Only").with_entry(Recurrence::Weekdays, t(9, 0), t(17, 0));
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert!(block.windows_on(sunday).is_empty());
    }

    #[test]
    fn test_overlapping_entries_merge_to_union() {
        let block = TimeBlock::new("Overlap")
            .with_entry(Recurrence::Daily, t(8, 0), t(12, 0))
            .with_entry(Recurrence::Daily, t(11, 0), t(14, 0));

        let windows = block.windows_on(monday());
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], TimeWindow::new(t(8, 0), t(14, 0)));
    }

    #[test]
    fn test_back_to_back_entries_stay_separate() {
        let block = TimeBlock::new("Split Day")
            .with_entry(Recurrence::Daily, t(8, 0), t(12, 0))
            .with_entry(Recurrence::Daily, t(12, 0), t(16, 0));

        let windows = block.windows_on(monday());
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_expansion_is_stable() {
        let block = TimeBlock::new("Stable")
            .with_entry(Recurrence::Weekdays, t(8, 0), t(12, 0))
            .with_entry(Recurrence::Weekdays, t(13, 0), t(17, 0));

        assert_eq!(block.windows_on(monday()), block.windows_on(monday()));
    }

    #[test]
    fn test_default_flag() {
        let block = TimeBlock::new("Default").as_default();
        assert!(block.is_default());
        assert!(!TimeBlock::new("Other").is_default());
    }
}
