//! Weight stability and logging consistency stats.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::DailyLogRecord;
use crate::num::{clamp_index, round1, round2};
use crate::window::RangeWindow;

/// Latest in-window weight compared against a pre-window baseline.
///
/// All fields are null when the window holds no weighed log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightDelta {
    pub latest_weight_lb: Option<f64>,
    pub baseline_weight_lb: Option<f64>,
    pub delta_lb: Option<f64>,
    pub delta_pct: Option<f64>,
}

impl WeightDelta {
    fn empty() -> Self {
        Self {
            latest_weight_lb: None,
            baseline_weight_lb: None,
            delta_lb: None,
            delta_pct: None,
        }
    }
}

/// Share of window days without any log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistency {
    /// Gap percentage: 0 means every day was logged.
    pub percent: u32,
    pub logged_days: usize,
    pub gap_days: usize,
    pub range_days: usize,
}

/// Weighed logs sorted ascending by date, then update time.
fn weight_logs_ascending(logs: &[DailyLogRecord]) -> Vec<&DailyLogRecord> {
    let mut weighed: Vec<&DailyLogRecord> = logs
        .iter()
        .filter(|log| log.weight_lb.is_some())
        .collect();
    weighed.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.updated_at.cmp(&b.updated_at))
    });
    weighed
}

/// Weight change over a `days`-long window ending at `anchor`.
///
/// The baseline is the last weighed log dated strictly before the window
/// start; when none exists, the earliest weighed log inside the window
/// stands in, which makes the delta for a first-ever window read as the
/// change across that window.
pub fn derive_weight_delta(logs: &[DailyLogRecord], days: u32, anchor: NaiveDate) -> WeightDelta {
    let window = RangeWindow::ending_at(days, anchor);
    let weighed = weight_logs_ascending(logs);
    if weighed.is_empty() {
        return WeightDelta::empty();
    }

    let in_range: Vec<&&DailyLogRecord> = weighed
        .iter()
        .filter(|log| window.contains(&log.date))
        .collect();
    let Some(latest) = in_range.last() else {
        return WeightDelta::empty();
    };
    let Some(latest_weight) = latest.weight_lb else {
        return WeightDelta::empty();
    };

    let baseline = weighed
        .iter()
        .rev()
        .find(|log| log.date < window.from_date)
        .or_else(|| in_range.first().copied());
    let Some(baseline_weight) = baseline.and_then(|log| log.weight_lb) else {
        return WeightDelta {
            latest_weight_lb: Some(latest_weight),
            ..WeightDelta::empty()
        };
    };

    let delta_lb = round2(latest_weight - baseline_weight);
    let delta_pct = if baseline_weight > 0.0 {
        Some(round1(delta_lb / baseline_weight * 100.0))
    } else {
        None
    };

    WeightDelta {
        latest_weight_lb: Some(latest_weight),
        baseline_weight_lb: Some(baseline_weight),
        delta_lb: Some(delta_lb),
        delta_pct,
    }
}

/// Gap share of a `days`-long window ending at `anchor`.
///
/// Multiple logs on the same date count as one logged day.
pub fn derive_consistency(logs: &[DailyLogRecord], days: u32, anchor: NaiveDate) -> Consistency {
    let window = RangeWindow::ending_at(days, anchor);

    let mut logged_dates: Vec<&str> = logs
        .iter()
        .filter(|log| window.contains(&log.date))
        .map(|log| log.date.as_str())
        .collect();
    logged_dates.sort_unstable();
    logged_dates.dedup();
    let logged_days = logged_dates.len();

    let gap_days = window.days.saturating_sub(logged_days);
    let percent = if window.days == 0 {
        0
    } else {
        clamp_index(gap_days as f64 / window.days as f64 * 100.0)
    };

    Consistency {
        percent,
        logged_days,
        gap_days,
        range_days: window.days,
    }
}
