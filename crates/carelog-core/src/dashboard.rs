//! Dashboard payload assembly.
//!
//! Pulls the per-concern derivations together into one plain-data payload
//! per requested range. Everything here is value/label/date records; how
//! they render is the host's business.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::alerts::filter_logs;
use crate::burden::{derive_burden_window, derive_daily_burden_series, BurdenWindow};
use crate::hybrid::{derive_hybrid_alerts, HybridAlertChip};
use crate::insights::{derive_weighted_issue_series, WeightedIssueRankItem, WeightedSeriesPoint};
use crate::models::{ClinicalEvent, DailyLogRecord, LexiconTerm};
use crate::num::round2;
use crate::stability::{derive_consistency, derive_weight_delta, Consistency, WeightDelta};
use crate::window::{RangeKey, RangeWindow};
use crate::zones::{collapse_points_by_date, MeasurementPoint, SeriesSource};

/// Reference weight line drawn on the weight timeline, in pounds.
pub const HEALTHY_REFERENCE_LB: f64 = 8.0;

/// Clinical measurement key carrying body weight.
const WEIGHT_METRIC_KEY: &str = "weight-lb";

/// Log cap applied when slicing the in-range trend.
const RANGE_LOG_LIMIT: usize = 365;

/// How many ranked issues the mainboard carries.
const ISSUE_RANK_LIMIT: usize = 5;

/// How many snapshot entries and recent events the mainboard carries.
const SNAPSHOT_LIMIT: usize = 6;

/// Latest recorded value for one measurement key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSnapshotItem {
    pub key: String,
    pub label: String,
    pub value_text: String,
    pub date: String,
}

/// Latest value text per measurement key, newest keys first.
pub fn derive_measurement_snapshot(
    events: &[ClinicalEvent],
    limit: usize,
) -> Vec<MeasurementSnapshotItem> {
    let mut items: Vec<MeasurementSnapshotItem> = Vec::new();

    for event in crate::models::sort_events_descending(events) {
        for measurement in &event.measurements {
            if items.iter().any(|item| item.key == measurement.key) {
                continue;
            }
            let unit = measurement
                .unit
                .as_deref()
                .map(|unit| format!(" {unit}"))
                .unwrap_or_default();
            items.push(MeasurementSnapshotItem {
                key: measurement.key.clone(),
                label: measurement.label.clone(),
                value_text: format!(
                    "{}{}{unit}",
                    measurement.comparator.prefix(),
                    measurement.value
                ),
                date: event.date.clone(),
            });
        }
    }

    items.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.key.cmp(&b.key)));
    items.truncate(limit);
    items
}

/// Null-safe metric averages over the in-range logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub avg_water_intake_oz: Option<f64>,
    pub avg_appetite_score: Option<f64>,
    pub avg_energy_score: Option<f64>,
    pub total_vomiting_events: f64,
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let usable: Vec<f64> = values.flatten().collect();
    if usable.is_empty() {
        return None;
    }
    Some(round2(usable.iter().sum::<f64>() / usable.len() as f64))
}

pub fn derive_dashboard_stats(logs_in_range: &[&DailyLogRecord]) -> DashboardStats {
    DashboardStats {
        avg_water_intake_oz: average(logs_in_range.iter().map(|log| log.water_intake_oz)),
        avg_appetite_score: average(logs_in_range.iter().map(|log| log.appetite_score)),
        avg_energy_score: average(logs_in_range.iter().map(|log| log.energy_score)),
        total_vomiting_events: logs_in_range
            .iter()
            .filter_map(|log| log.vomiting_count)
            .sum(),
    }
}

/// One merged weight point. Log weight wins same-date collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTimelinePoint {
    pub date: String,
    pub weight_lb: f64,
    pub source: SeriesSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAxis {
    pub min: f64,
    pub max: f64,
}

/// Merged weight series with fixed healthy reference and padded axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTimeline {
    pub healthy_reference_lb: f64,
    pub series: Vec<WeightTimelinePoint>,
    pub y_axis: WeightAxis,
}

fn log_weight_points(logs: &[DailyLogRecord], window: &RangeWindow) -> Vec<MeasurementPoint> {
    let points = logs
        .iter()
        .filter(|log| window.contains(&log.date))
        .filter_map(|log| {
            log.weight_lb.map(|weight| MeasurementPoint {
                date: log.date.clone(),
                raw_value: weight,
                source: SeriesSource::Log,
                context_text: log.notes.clone(),
            })
        })
        .collect();
    collapse_points_by_date(points)
}

fn weight_axis_bounds(series: &[WeightTimelinePoint], healthy_reference_lb: f64) -> WeightAxis {
    let mut min_value = healthy_reference_lb;
    let mut max_value = healthy_reference_lb;
    for point in series {
        min_value = min_value.min(point.weight_lb);
        max_value = max_value.max(point.weight_lb);
    }

    let padded_min = ((min_value - 0.4) * 10.0).floor() / 10.0;
    let padded_max = ((max_value + 0.4) * 10.0).ceil() / 10.0;
    if padded_min >= padded_max {
        return WeightAxis {
            min: padded_min - 0.5,
            max: padded_max + 0.5,
        };
    }
    WeightAxis {
        min: padded_min,
        max: padded_max,
    }
}

/// Merged in-window weight timeline from logs and clinical events.
pub fn derive_weight_timeline(
    logs: &[DailyLogRecord],
    events: &[ClinicalEvent],
    window: &RangeWindow,
) -> WeightTimeline {
    let mut series: Vec<WeightTimelinePoint> = log_weight_points(logs, window)
        .into_iter()
        .map(|point| WeightTimelinePoint {
            date: point.date,
            weight_lb: round2(point.raw_value),
            source: SeriesSource::Merged,
        })
        .collect();

    let clinical_points = crate::zones::extract_measurement_points(
        events,
        WEIGHT_METRIC_KEY,
        &window.from_date,
        &window.to_date,
    );
    for point in clinical_points {
        if series.iter().any(|existing| existing.date == point.date) {
            continue;
        }
        series.push(WeightTimelinePoint {
            date: point.date,
            weight_lb: round2(point.raw_value),
            source: SeriesSource::Merged,
        });
    }
    series.sort_by(|a, b| a.date.cmp(&b.date));

    let y_axis = weight_axis_bounds(&series, HEALTHY_REFERENCE_LB);
    WeightTimeline {
        healthy_reference_lb: HEALTHY_REFERENCE_LB,
        series,
        y_axis,
    }
}

/// One trend day: weight (when logged) alongside the burden scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub weight_lb: Option<f64>,
    pub burden_raw: f64,
    pub burden_index: u32,
}

/// Latest weight per date (later update wins), joined onto the daily
/// burden series.
fn build_trend_series(
    burden_series: &[crate::burden::BurdenSeriesPoint],
    logs: &[DailyLogRecord],
) -> Vec<TrendPoint> {
    let mut chronological: Vec<&DailyLogRecord> = logs.iter().collect();
    chronological.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.updated_at.cmp(&b.updated_at))
    });

    let mut latest_weight_by_date: std::collections::HashMap<&str, f64> =
        std::collections::HashMap::new();
    for log in chronological {
        if let Some(weight) = log.weight_lb {
            latest_weight_by_date.insert(log.date.as_str(), weight);
        }
    }

    burden_series
        .iter()
        .map(|point| TrendPoint {
            date: point.date.clone(),
            weight_lb: latest_weight_by_date.get(point.date.as_str()).copied(),
            burden_raw: point.raw_score,
            burden_index: point.index,
        })
        .collect()
}

/// Everything one dashboard render needs for a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainboardPayload {
    pub range: RangeKey,
    pub latest_log_date: Option<String>,
    pub weight_delta: WeightDelta,
    pub burden: BurdenWindow,
    pub consistency: Consistency,
    pub stats: DashboardStats,
    pub trend_series: Vec<TrendPoint>,
    pub hybrid_alerts: Vec<HybridAlertChip>,
    pub issue_rank: Vec<WeightedIssueRankItem>,
    pub issue_daily_series: Vec<WeightedSeriesPoint>,
    pub clinical_events_recent: Vec<ClinicalEvent>,
    pub measurement_snapshot: Vec<MeasurementSnapshotItem>,
}

/// Assemble the full mainboard payload for a range ending at `anchor`.
///
/// `logs` must already be annotated by [`crate::alerts::derive_logs`].
pub fn derive_mainboard(
    logs: &[DailyLogRecord],
    terms: &[LexiconTerm],
    events: &[ClinicalEvent],
    range: RangeKey,
    anchor: NaiveDate,
) -> MainboardPayload {
    let days = range.days();
    let window = RangeWindow::ending_at(days, anchor);

    let logs_in_range = filter_logs(
        logs,
        Some(&window.from_date),
        Some(&window.to_date),
        Some(RANGE_LOG_LIMIT),
    );
    let latest_log_date = logs_in_range
        .iter()
        .map(|log| log.date.as_str())
        .max()
        .map(str::to_string);

    let burden_series = derive_daily_burden_series(logs, terms, days, anchor);
    let issue_series = derive_weighted_issue_series(logs, terms, &window, ISSUE_RANK_LIMIT);
    let recent_events: Vec<ClinicalEvent> = crate::models::sort_events_descending(events)
        .into_iter()
        .take(SNAPSHOT_LIMIT)
        .cloned()
        .collect();

    MainboardPayload {
        range,
        latest_log_date,
        weight_delta: derive_weight_delta(logs, days, anchor),
        burden: derive_burden_window(logs, terms, days, anchor),
        consistency: derive_consistency(logs, days, anchor),
        stats: derive_dashboard_stats(&logs_in_range),
        trend_series: build_trend_series(&burden_series, logs),
        hybrid_alerts: derive_hybrid_alerts(logs, terms, &window),
        issue_rank: issue_series.rank,
        issue_daily_series: issue_series.daily_series,
        clinical_events_recent: recent_events,
        measurement_snapshot: derive_measurement_snapshot(events, SNAPSHOT_LIMIT),
    }
}
