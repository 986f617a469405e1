//! Calendar-month windows cut in a fixed UTC offset.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

/// Number of months in every trailing trend.
pub const TRAILING_MONTHS: usize = 6;

/// One calendar month as a half-open `[start, end)` interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// The month containing `instant` when read in `offset`.
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = instant.with_timezone(&offset);
        Self::from_index(month_index(local.year(), local.month()), offset)
    }

    fn from_index(index: i64, offset: FixedOffset) -> Self {
        let (year, month) = split_index(index);
        let (next_year, next_month) = split_index(index + 1);
        Self {
            year,
            month,
            start: month_start(year, month, offset),
            end: month_start(next_year, next_month, offset),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// `year/month` without zero padding, e.g. `2025/3`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.year, self.month)
    }

    /// The month `n` months before this one.
    pub fn shifted_back(&self, n: i64, offset: FixedOffset) -> Self {
        Self::from_index(month_index(self.year, self.month) - n, offset)
    }
}

/// The `count` months ending at the month containing `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, offset: FixedOffset, count: usize) -> Vec<MonthWindow> {
    let current = MonthWindow::containing(now, offset);
    (0..count as i64)
        .rev()
        .map(|back| current.shifted_back(back, offset))
        .collect()
}

/// Index of the window containing `instant`, if any.
pub fn window_index(windows: &[MonthWindow], instant: DateTime<Utc>) -> Option<usize> {
    windows.iter().position(|w| w.contains(instant))
}

fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn split_index(index: i64) -> (i32, u32) {
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

fn month_start(year: i32, month: u32, offset: FixedOffset) -> DateTime<Utc> {
    // Day 1 exists in every month and a fixed offset has no gaps, so the
    // fallback arm is unreachable for in-range years.
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
