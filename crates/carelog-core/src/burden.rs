//! Symptom burden scoring.
//!
//! The raw score is the sum of weighted issue mentions inside the selected
//! window. The index normalizes that sum against the worst same-length
//! stretch of the trailing 90 days, so "100" always means "as bad as the
//! worst recent period" rather than an absolute scale.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::insights::{collect_issue_rows, MentionRow};
use crate::models::{DailyLogRecord, LexiconTerm};
use crate::num::{clamp_index, round2};
use crate::window::RangeWindow;

/// Trailing reference horizon, in days.
const REFERENCE_DAYS: u32 = 90;

/// Burden for one selected window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurdenWindow {
    pub raw_score: f64,
    /// 0..=100, normalized against [`BurdenWindow::reference_peak`].
    pub index: u32,
    /// Worst same-length rolling sum over the trailing 90 days.
    pub reference_peak: f64,
    pub analyzed_logs: u32,
}

/// One day of the burden trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurdenSeriesPoint {
    pub date: String,
    pub raw_score: f64,
    pub index: u32,
}

/// Weighted totals per window date, zero-filled for quiet days.
fn daily_weighted_totals(rows: &[MentionRow], window: &RangeWindow) -> Vec<f64> {
    let mut totals = vec![0.0; window.dates.len()];
    for row in rows {
        if let Some(position) = window.dates.iter().position(|date| *date == row.date) {
            totals[position] += row.weighted_score;
        }
    }
    totals
}

/// Maximum sum over any `window_size` consecutive values.
///
/// A window at least as long as the input degrades to the total sum.
fn rolling_window_peak(values: &[f64], window_size: usize) -> f64 {
    if values.is_empty() || window_size == 0 {
        return 0.0;
    }
    if window_size >= values.len() {
        return values.iter().sum();
    }

    let mut sum: f64 = values[..window_size].iter().sum();
    let mut peak = sum;
    for index in window_size..values.len() {
        sum += values[index];
        sum -= values[index - window_size];
        if sum > peak {
            peak = sum;
        }
    }
    peak
}

/// `value` as a percentage of `reference`, clamped into `0..=100`.
fn normalize_index(value: f64, reference: f64) -> u32 {
    if reference <= 0.0 || value <= 0.0 {
        return 0;
    }
    clamp_index(value / reference * 100.0)
}

/// Burden summary for a `days`-long window ending at `anchor`.
pub fn derive_burden_window(
    logs: &[DailyLogRecord],
    terms: &[LexiconTerm],
    days: u32,
    anchor: NaiveDate,
) -> BurdenWindow {
    let selected = RangeWindow::ending_at(days, anchor);
    let reference = RangeWindow::ending_at(REFERENCE_DAYS, anchor);

    let selected_rows = collect_issue_rows(logs, terms, &selected);
    let raw: f64 = selected_rows
        .rows
        .iter()
        .map(|row| row.weighted_score)
        .sum();

    let reference_rows = collect_issue_rows(logs, terms, &reference);
    let reference_totals = daily_weighted_totals(&reference_rows.rows, &reference);
    let reference_peak = rolling_window_peak(&reference_totals, selected.days);

    BurdenWindow {
        raw_score: round2(raw),
        index: normalize_index(raw, reference_peak),
        reference_peak: round2(reference_peak),
        analyzed_logs: selected_rows.analyzed_logs,
    }
}

/// Per-day burden inside the selected window, each day indexed against the
/// single worst day of the trailing 90 days.
pub fn derive_daily_burden_series(
    logs: &[DailyLogRecord],
    terms: &[LexiconTerm],
    days: u32,
    anchor: NaiveDate,
) -> Vec<BurdenSeriesPoint> {
    let selected = RangeWindow::ending_at(days, anchor);
    let reference = RangeWindow::ending_at(REFERENCE_DAYS, anchor);

    let selected_rows = collect_issue_rows(logs, terms, &selected);
    let selected_totals = daily_weighted_totals(&selected_rows.rows, &selected);

    let reference_rows = collect_issue_rows(logs, terms, &reference);
    let reference_totals = daily_weighted_totals(&reference_rows.rows, &reference);
    let daily_peak = reference_totals.iter().copied().fold(0.0_f64, f64::max);

    selected
        .dates
        .iter()
        .zip(selected_totals)
        .map(|(date, raw)| BurdenSeriesPoint {
            date: date.clone(),
            raw_score: round2(raw),
            index: normalize_index(raw, daily_peak),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{quick_log, sample_terms};

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()
    }

    #[test]
    fn rolling_peak_handles_degenerate_windows() {
        assert_eq!(rolling_window_peak(&[], 7), 0.0);
        assert_eq!(rolling_window_peak(&[1.0, 2.0], 0), 0.0);
        assert_eq!(rolling_window_peak(&[1.0, 2.0, 3.0], 5), 6.0);
    }

    #[test]
    fn rolling_peak_finds_the_worst_stretch() {
        let values = [0.0, 1.0, 4.0, 4.0, 0.0, 1.0];
        assert_eq!(rolling_window_peak(&values, 2), 8.0);
        assert_eq!(rolling_window_peak(&values, 3), 9.0);
    }

    #[test]
    fn quiet_logs_produce_zero_burden() {
        let logs = vec![quick_log("l1", "2026-02-24", Some("Calm day, ate well."), None)];
        let burden = derive_burden_window(&logs, &sample_terms(), 7, anchor());
        assert_eq!(burden.raw_score, 0.0);
        assert_eq!(burden.index, 0);
        assert_eq!(burden.analyzed_logs, 1);
    }

    #[test]
    fn selected_window_equal_to_peak_indexes_at_100() {
        // All mentions sit inside the selected 7 days, so the trailing
        // 90-day peak equals the selected raw score.
        let logs = vec![
            quick_log("l1", "2026-02-23", Some("vomiting twice"), None),
            quick_log("l2", "2026-02-24", Some("vomiting and low appetite"), None),
        ];
        let burden = derive_burden_window(&logs, &sample_terms(), 7, anchor());
        assert_eq!(burden.raw_score, 4.2);
        assert_eq!(burden.reference_peak, 4.2);
        assert_eq!(burden.index, 100);
    }

    #[test]
    fn worse_history_outside_the_window_lowers_the_index() {
        let logs = vec![
            // A very bad week in January dominates the 90-day peak.
            quick_log("h1", "2026-01-10", Some("vomiting vomiting vomiting"), None),
            quick_log("h2", "2026-01-11", Some("vomiting vomiting"), None),
            // One mild mention in the selected week.
            quick_log("l1", "2026-02-24", Some("low appetite today"), None),
        ];
        let burden = derive_burden_window(&logs, &sample_terms(), 7, anchor());
        assert_eq!(burden.raw_score, 1.2);
        assert_eq!(burden.reference_peak, 7.5);
        assert_eq!(burden.index, 16);
    }

    #[test]
    fn daily_series_is_dense_and_indexed_against_worst_day() {
        let logs = vec![
            quick_log("l1", "2026-02-22", Some("vomiting vomiting"), None),
            quick_log("l2", "2026-02-24", Some("vomiting"), None),
        ];
        let series = derive_daily_burden_series(&logs, &sample_terms(), 7, anchor());

        assert_eq!(series.len(), 7);
        let worst = series.iter().find(|p| p.date == "2026-02-22").unwrap();
        assert_eq!(worst.raw_score, 3.0);
        assert_eq!(worst.index, 100);
        let mild = series.iter().find(|p| p.date == "2026-02-24").unwrap();
        assert_eq!(mild.raw_score, 1.5);
        assert_eq!(mild.index, 50);
        let quiet = series.iter().find(|p| p.date == "2026-02-23").unwrap();
        assert_eq!(quiet.raw_score, 0.0);
        assert_eq!(quiet.index, 0);
    }
}
