//! Clinical measurement severity zones.
//!
//! Creatinine and SDMA map onto fixed IRIS stage bands; every other
//! measurement maps onto a relative percentile of its own history, with the
//! direction of concern supplied per panel. Zones 0..=4 share one label set
//! so staged and relative series plot on the same axis.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{ClinicalEvent, Comparator};
use crate::num::round2;
use crate::window::RangeWindow;

/// Fixed metric panel order. Key, display label.
pub const CLINICAL_METRICS: [(&str, &str); 12] = [
    ("creatinine", "Creatinine"),
    ("sdma", "SDMA"),
    ("bun", "BUN"),
    ("phosphorus", "Phosphorus"),
    ("albumin", "Albumin"),
    ("hct", "Hematocrit"),
    ("hemoglobin", "Hemoglobin"),
    ("pcv", "Packed Cell Volume"),
    ("upc", "UPC"),
    ("potassium", "Potassium"),
    ("total-protein", "Total Protein"),
    ("t4", "Total T4"),
];

/// Metrics where rising values signal trouble.
pub const HIGHER_WORSE_METRICS: [&str; 7] = [
    "bun",
    "creatinine",
    "sdma",
    "phosphorus",
    "upc",
    "potassium",
    "t4",
];

/// Metrics where falling values signal trouble.
pub const LOWER_WORSE_METRICS: [&str; 5] = ["albumin", "hct", "hemoglobin", "pcv", "total-protein"];

pub fn metric_label(metric_key: &str) -> &str {
    CLINICAL_METRICS
        .iter()
        .find(|(key, _)| *key == metric_key)
        .map(|(_, label)| *label)
        .unwrap_or(metric_key)
}

/// Severity zone, 0 (safe) through 4 (critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Zone {
    Safe,
    Stage1,
    Stage2,
    Stage3,
    Stage4,
}

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Zone::Safe => "Safe",
            Zone::Stage1 => "Stage 1",
            Zone::Stage2 => "Stage 2",
            Zone::Stage3 => "Stage 3",
            Zone::Stage4 => "Stage 4",
        }
    }

    fn meaning(self) -> &'static str {
        match self {
            Zone::Safe => "Operational baseline zone",
            Zone::Stage1 => "Mild concern / early CKD context",
            Zone::Stage2 => "CKD stage 2 band",
            Zone::Stage3 => "CKD stage 3 band",
            Zone::Stage4 => "CKD stage 4 / critical band",
        }
    }

    const ALL: [Zone; 5] = [
        Zone::Safe,
        Zone::Stage1,
        Zone::Stage2,
        Zone::Stage3,
        Zone::Stage4,
    ];
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> Self {
        match zone {
            Zone::Safe => 0,
            Zone::Stage1 => 1,
            Zone::Stage2 => 2,
            Zone::Stage3 => 3,
            Zone::Stage4 => 4,
        }
    }
}

impl TryFrom<u8> for Zone {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Zone::Safe),
            1 => Ok(Zone::Stage1),
            2 => Ok(Zone::Stage2),
            3 => Ok(Zone::Stage3),
            4 => Ok(Zone::Stage4),
            other => Err(format!("zone value out of range: {other}")),
        }
    }
}

/// How a metric's values were mapped to zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    IrisStaged,
    RelativeNonStaged,
}

/// Direction of concern for relative mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherWorse,
    LowerWorse,
}

/// Provenance tag on chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    Log,
    ClinicalEvent,
    Merged,
}

/// Static zone band definition for chart legends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub zone: Zone,
    pub label: String,
    pub meaning: String,
}

pub fn zone_definitions() -> Vec<ZoneDefinition> {
    Zone::ALL
        .iter()
        .map(|zone| ZoneDefinition {
            zone: *zone,
            label: zone.label().to_string(),
            meaning: zone.meaning().to_string(),
        })
        .collect()
}

// === Zone mappers ===

static EARLY_CKD_CONTEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(early|initial|possible|suspected)?\s*(ckd|kidney|renal)\b").unwrap()
});

fn matches_early_ckd_context(context_text: Option<&str>) -> bool {
    context_text
        .map(|text| EARLY_CKD_CONTEXT_RE.is_match(text))
        .unwrap_or(false)
}

/// IRIS-style creatinine bands (mg/dL). A sub-threshold value still lands
/// in Stage 1 when the surrounding text mentions CKD.
pub fn map_creatinine_zone(value: f64, context_text: Option<&str>) -> Zone {
    if value < 1.6 {
        return if matches_early_ckd_context(context_text) {
            Zone::Stage1
        } else {
            Zone::Safe
        };
    }
    if value <= 2.8 {
        return Zone::Stage2;
    }
    if value <= 5.0 {
        return Zone::Stage3;
    }
    Zone::Stage4
}

/// IRIS-style SDMA bands (µg/dL).
pub fn map_sdma_zone(value: f64) -> Zone {
    if value < 14.0 {
        return Zone::Safe;
    }
    if value <= 17.0 {
        return Zone::Stage1;
    }
    if value <= 25.0 {
        return Zone::Stage2;
    }
    if value <= 38.0 {
        return Zone::Stage3;
    }
    Zone::Stage4
}

/// Position of `value` within its own history as a 0..=1 risk fraction.
///
/// A single-point history always reads as zero risk.
pub fn risk_percentile(all_values: &[f64], value: f64, direction: Direction) -> f64 {
    if all_values.len() <= 1 {
        return 0.0;
    }

    let mut sorted = all_values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let max_index = sorted.len() - 1;

    let mut ascending_index = 0;
    for (index, candidate) in sorted.iter().enumerate() {
        if *candidate <= value {
            ascending_index = index;
        } else {
            break;
        }
    }

    let ascending = ascending_index as f64 / max_index as f64;
    match direction {
        Direction::HigherWorse => ascending,
        Direction::LowerWorse => 1.0 - ascending,
    }
}

/// Quintile banding of a risk percentile.
pub fn percentile_zone(percentile: f64) -> Zone {
    if percentile < 0.2 {
        return Zone::Safe;
    }
    if percentile < 0.4 {
        return Zone::Stage1;
    }
    if percentile < 0.6 {
        return Zone::Stage2;
    }
    if percentile < 0.8 {
        return Zone::Stage3;
    }
    Zone::Stage4
}

// === Measurement extraction ===

/// One dated measurement value with its surrounding event text.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPoint {
    pub date: String,
    pub raw_value: f64,
    pub source: SeriesSource,
    pub context_text: Option<String>,
}

/// Average same-date points and union their context texts, ascending by
/// date.
pub fn collapse_points_by_date(points: Vec<MeasurementPoint>) -> Vec<MeasurementPoint> {
    struct Bucket {
        sum: f64,
        count: u32,
        source: SeriesSource,
        contexts: Vec<String>,
    }

    let mut grouped: BTreeMap<String, Bucket> = BTreeMap::new();
    for point in points {
        let bucket = grouped.entry(point.date.clone()).or_insert(Bucket {
            sum: 0.0,
            count: 0,
            source: point.source,
            contexts: Vec::new(),
        });
        bucket.sum += point.raw_value;
        bucket.count += 1;
        if let Some(context) = point.context_text.as_deref() {
            let trimmed = context.trim();
            if !trimmed.is_empty() && !bucket.contexts.iter().any(|c| c == trimmed) {
                bucket.contexts.push(trimmed.to_string());
            }
        }
    }

    grouped
        .into_iter()
        .map(|(date, bucket)| MeasurementPoint {
            date,
            raw_value: bucket.sum / f64::from(bucket.count),
            source: bucket.source,
            context_text: if bucket.contexts.is_empty() {
                None
            } else {
                Some(bucket.contexts.join(" "))
            },
        })
        .collect()
}

/// In-window measurement points for one metric, collapsed per date.
pub fn extract_measurement_points(
    events: &[ClinicalEvent],
    metric_key: &str,
    from_date: &str,
    to_date: &str,
) -> Vec<MeasurementPoint> {
    let mut points = Vec::new();
    for event in events {
        if event.date.as_str() < from_date || event.date.as_str() > to_date {
            continue;
        }
        for measurement in &event.measurements {
            if measurement.key != metric_key {
                continue;
            }
            points.push(MeasurementPoint {
                date: event.date.clone(),
                raw_value: measurement.value,
                source: SeriesSource::ClinicalEvent,
                context_text: Some(event.context_text()),
            });
        }
    }
    collapse_points_by_date(points)
}

/// One measurement kept with its comparator and unit for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalObservation {
    pub date: String,
    pub raw_value: f64,
    pub comparator: Comparator,
    pub unit: Option<String>,
    pub context_text: Option<String>,
}

impl ClinicalObservation {
    /// Display text, e.g. `>5.0 mg/dL`.
    pub fn value_text(&self) -> String {
        let unit = self
            .unit
            .as_deref()
            .map(|unit| format!(" {unit}"))
            .unwrap_or_default();
        format!("{}{}{unit}", self.comparator.prefix(), self.raw_value)
    }
}

/// Observations for one metric in `[from_date, to_date]` (either bound
/// optional), ascending by event date then id.
fn extract_observations(
    events: &[ClinicalEvent],
    metric_key: &str,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Vec<ClinicalObservation> {
    let mut observations = Vec::new();
    for event in crate::models::sort_events_ascending(events) {
        if from_date.is_some_and(|from| event.date.as_str() < from) {
            continue;
        }
        if to_date.is_some_and(|to| event.date.as_str() > to) {
            continue;
        }
        for measurement in &event.measurements {
            if measurement.key != metric_key {
                continue;
            }
            observations.push(ClinicalObservation {
                date: event.date.clone(),
                raw_value: measurement.value,
                comparator: measurement.comparator,
                unit: measurement.unit.clone(),
                context_text: Some(event.context_text()),
            });
        }
    }
    observations
}

/// Latest observation for a metric: in-window first, then any observation
/// at or before the window end, flagged stale.
pub fn resolve_latest_observation(
    events: &[ClinicalEvent],
    metric_key: &str,
    window: &RangeWindow,
) -> Option<(ClinicalObservation, bool)> {
    let in_range = extract_observations(
        events,
        metric_key,
        Some(window.from_date.as_str()),
        Some(window.to_date.as_str()),
    );
    if let Some(latest) = in_range.into_iter().last() {
        return Some((latest, false));
    }

    let historical = extract_observations(events, metric_key, None, Some(window.to_date.as_str()));
    historical.into_iter().last().map(|latest| (latest, true))
}

// === Directional panels ===

/// Summary row for one metric in a directional panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalMetricRow {
    pub metric_key: String,
    pub metric_label: String,
    pub value_text: String,
    pub date: String,
    pub source: SeriesSource,
    pub severity_zone: Zone,
    pub severity_label: String,
    pub stale: bool,
    pub mapping_kind: MappingKind,
}

/// One plotted point. `raw_value` is null on assumed-baseline series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSeriesPoint {
    pub date: String,
    pub raw_value: Option<f64>,
    pub zone_value: Zone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMetricSeries {
    pub metric_key: String,
    pub metric_label: String,
    pub source: SeriesSource,
    pub points: Vec<ZoneSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneLegendEntry {
    pub metric_key: String,
    pub metric_label: String,
    pub source: SeriesSource,
    pub staged: bool,
    #[serde(default)]
    pub assumed: bool,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAxis {
    pub min: u8,
    pub max: u8,
    pub ticks: Vec<u8>,
}

/// One directional clinical panel: rows plus zone-mapped chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalPanel {
    pub zones: Vec<ZoneDefinition>,
    pub healthy_baseline_zone: Zone,
    pub rows: Vec<DirectionalMetricRow>,
    pub series: Vec<ZoneMetricSeries>,
    pub legend: Vec<ZoneLegendEntry>,
    pub y_axis: ZoneAxis,
}

fn is_iris_metric(metric_key: &str) -> bool {
    metric_key == "creatinine" || metric_key == "sdma"
}

/// Every historical value for a metric at or before `to_date`, for relative
/// percentile mapping.
fn historical_values(events: &[ClinicalEvent], metric_key: &str, to_date: &str) -> Vec<f64> {
    extract_observations(events, metric_key, None, Some(to_date))
        .into_iter()
        .map(|observation| observation.raw_value)
        .collect()
}

fn map_point_zone(
    metric_key: &str,
    value: f64,
    context_text: Option<&str>,
    all_values: &[f64],
    direction: Direction,
) -> Zone {
    if metric_key == "creatinine" {
        return map_creatinine_zone(value, context_text);
    }
    if metric_key == "sdma" {
        return map_sdma_zone(value);
    }
    percentile_zone(risk_percentile(all_values, value, direction))
}

fn to_directional_row(
    events: &[ClinicalEvent],
    metric_key: &str,
    direction: Direction,
    window: &RangeWindow,
) -> Option<DirectionalMetricRow> {
    let (observation, stale) = resolve_latest_observation(events, metric_key, window)?;

    let severity_zone = if is_iris_metric(metric_key) {
        map_point_zone(
            metric_key,
            observation.raw_value,
            observation.context_text.as_deref(),
            &[],
            direction,
        )
    } else {
        let values = historical_values(events, metric_key, &window.to_date);
        let values = if values.is_empty() {
            vec![observation.raw_value]
        } else {
            values
        };
        map_point_zone(
            metric_key,
            observation.raw_value,
            observation.context_text.as_deref(),
            &values,
            direction,
        )
    };

    Some(DirectionalMetricRow {
        metric_key: metric_key.to_string(),
        metric_label: metric_label(metric_key).to_string(),
        value_text: observation.value_text(),
        date: observation.date,
        source: SeriesSource::ClinicalEvent,
        severity_zone,
        severity_label: severity_zone.label().to_string(),
        stale,
        mapping_kind: if is_iris_metric(metric_key) {
            MappingKind::IrisStaged
        } else {
            MappingKind::RelativeNonStaged
        },
    })
}

/// Flat Safe-zone line spanning the window, drawn under every metric so a
/// metric with no data still shows an assumed-healthy baseline.
fn assumed_baseline_points(window: &RangeWindow) -> Vec<ZoneSeriesPoint> {
    let mut points = vec![ZoneSeriesPoint {
        date: window.from_date.clone(),
        raw_value: None,
        zone_value: Zone::Safe,
    }];
    if window.from_date != window.to_date {
        points.push(ZoneSeriesPoint {
            date: window.to_date.clone(),
            raw_value: None,
            zone_value: Zone::Safe,
        });
    }
    points
}

fn derive_directional_series(
    events: &[ClinicalEvent],
    metric_keys: &[&str],
    direction: Direction,
    window: &RangeWindow,
) -> (Vec<ZoneMetricSeries>, Vec<ZoneLegendEntry>) {
    let mut series = Vec::new();
    let mut legend = Vec::new();

    for metric_key in metric_keys {
        let points =
            extract_measurement_points(events, metric_key, &window.from_date, &window.to_date);
        let staged = is_iris_metric(metric_key);
        let label = metric_label(metric_key).to_string();
        let all_values = if staged {
            Vec::new()
        } else {
            let historical = historical_values(events, metric_key, &window.to_date);
            if historical.is_empty() {
                points.iter().map(|point| point.raw_value).collect()
            } else {
                historical
            }
        };

        if !points.is_empty() {
            series.push(ZoneMetricSeries {
                metric_key: metric_key.to_string(),
                metric_label: label.clone(),
                source: SeriesSource::ClinicalEvent,
                points: points
                    .iter()
                    .map(|point| ZoneSeriesPoint {
                        date: point.date.clone(),
                        raw_value: Some(round2(point.raw_value)),
                        zone_value: map_point_zone(
                            metric_key,
                            point.raw_value,
                            point.context_text.as_deref(),
                            &all_values,
                            direction,
                        ),
                    })
                    .collect(),
            });
            legend.push(ZoneLegendEntry {
                metric_key: metric_key.to_string(),
                metric_label: label.clone(),
                source: SeriesSource::ClinicalEvent,
                staged,
                assumed: false,
                direction,
            });
        }

        series.push(ZoneMetricSeries {
            metric_key: metric_key.to_string(),
            metric_label: label.clone(),
            source: SeriesSource::Merged,
            points: assumed_baseline_points(window),
        });
        legend.push(ZoneLegendEntry {
            metric_key: metric_key.to_string(),
            metric_label: label,
            source: SeriesSource::Merged,
            staged: false,
            assumed: true,
            direction,
        });
    }

    (series, legend)
}

fn derive_panel(
    events: &[ClinicalEvent],
    metric_keys: &[&str],
    direction: Direction,
    window: &RangeWindow,
) -> DirectionalPanel {
    let rows = metric_keys
        .iter()
        .filter_map(|metric_key| to_directional_row(events, metric_key, direction, window))
        .collect();
    let (series, legend) = derive_directional_series(events, metric_keys, direction, window);

    DirectionalPanel {
        zones: zone_definitions(),
        healthy_baseline_zone: Zone::Safe,
        rows,
        series,
        legend,
        y_axis: ZoneAxis {
            min: 0,
            max: 4,
            ticks: vec![0, 1, 2, 3, 4],
        },
    }
}

/// Panel for metrics where rising values signal trouble.
pub fn derive_higher_worse_panel(events: &[ClinicalEvent], window: &RangeWindow) -> DirectionalPanel {
    derive_panel(events, &HIGHER_WORSE_METRICS, Direction::HigherWorse, window)
}

/// Panel for metrics where falling values signal trouble.
pub fn derive_lower_worse_panel(events: &[ClinicalEvent], window: &RangeWindow) -> DirectionalPanel {
    derive_panel(events, &LOWER_WORSE_METRICS, Direction::LowerWorse, window)
}
