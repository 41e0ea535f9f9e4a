//! Settlement Period Semantics
//!
//! Single source of truth for the monthly settlement window. The window is
//! half-open `[start, end)`: an event stamped exactly at `end` belongs to the
//! next period. All boundaries are UTC calendar months.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One settlement window, aligned to a UTC calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPeriod {
    /// First instant of the period (inclusive).
    pub start: DateTime<Utc>,
    /// First instant of the next period (exclusive).
    pub end: DateTime<Utc>,
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

impl SettlementPeriod {
    /// Period covering the given UTC year/month. `None` for an invalid month.
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let start = month_start(year, month)?;
        let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let end = month_start(ny, nm)?;
        Some(Self { start, end })
    }

    /// The calendar month preceding `now` — the default period for a run.
    pub fn previous_month(now: DateTime<Utc>) -> Option<Self> {
        let (y, m) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        Self::for_month(y, m)
    }

    /// Parse a period tag like `"2026-03"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let (y, m) = tag.split_once('-')?;
        let year: i32 = y.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        Self::for_month(year, month)
    }

    /// Period identifier, e.g. `"2026-03"`.
    pub fn tag(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }

    /// Half-open membership test: `start <= ts < end`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// 1-based count of calendar months from the launch month to this
    /// period's month. The launch month itself is month 1; a period before
    /// launch yields 0 or less.
    pub fn months_since(&self, launch: DateTime<Utc>) -> i32 {
        let years = self.start.year() - launch.year();
        let months = self.start.month() as i32 - launch.month() as i32;
        years * 12 + months + 1
    }
}

// =============================================================================
// TESTS
// =============================================================================
