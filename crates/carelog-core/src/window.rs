//! Inclusive calendar-date windows.
//!
//! All record dates are ISO `YYYY-MM-DD` strings compared lexicographically;
//! `chrono` is only used to enumerate the dense date list of a window.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Preset observation ranges accepted by the dashboard entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeKey {
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
}

impl RangeKey {
    /// Parse a range token; anything unrecognized falls back to 30 days.
    pub fn parse(range: Option<&str>) -> Self {
        match range {
            Some("7d") => RangeKey::Days7,
            Some("90d") => RangeKey::Days90,
            _ => RangeKey::Days30,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            RangeKey::Days7 => 7,
            RangeKey::Days30 => 30,
            RangeKey::Days90 => 90,
        }
    }
}

/// An inclusive `[from_date, to_date]` window with its dense date list.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWindow {
    pub days: usize,
    pub from_date: String,
    pub to_date: String,
    /// Every calendar date in the window, ascending. One entry per day.
    pub dates: Vec<String>,
}

impl RangeWindow {
    /// Window of `days` calendar days ending at `anchor` (inclusive).
    pub fn ending_at(days: u32, anchor: NaiveDate) -> Self {
        let days = days.max(1);
        let from = anchor - Duration::days(i64::from(days) - 1);
        let from_date = iso_date(from);
        let to_date = iso_date(anchor);
        let dates = list_iso_dates(&from_date, &to_date);

        Self {
            days: dates.len(),
            from_date,
            to_date,
            dates,
        }
    }

    /// Window of `days` calendar days ending at today's UTC date.
    pub fn ending_today(days: u32) -> Self {
        Self::ending_at(days, Utc::now().date_naive())
    }

    /// Window from explicit bounds; reversed bounds are swapped.
    pub fn from_bounds(from_date: &str, to_date: &str) -> Self {
        let (from, to) = if from_date <= to_date {
            (from_date, to_date)
        } else {
            (to_date, from_date)
        };
        let dates = list_iso_dates(from, to);

        Self {
            days: dates.len(),
            from_date: from.to_string(),
            to_date: to.to_string(),
            dates,
        }
    }

    /// Lexicographic containment check.
    pub fn contains(&self, date: &str) -> bool {
        date >= self.from_date.as_str() && date <= self.to_date.as_str()
    }
}

/// Format a date as `YYYY-MM-DD`.
pub fn iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Every ISO date in `[from_date, to_date]`, ascending.
///
/// Unparsable bounds degrade to an empty list rather than panicking.
pub fn list_iso_dates(from_date: &str, to_date: &str) -> Vec<String> {
    let from = NaiveDate::parse_from_str(from_date, ISO_DATE_FORMAT);
    let to = NaiveDate::parse_from_str(to_date, ISO_DATE_FORMAT);
    let (Ok(from), Ok(to)) = (from, to) else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    let mut current = from;
    while current <= to {
        dates.push(iso_date(current));
        current += Duration::days(1);
    }
    dates
}
