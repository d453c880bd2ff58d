//! Threshold alert evaluation and log normalization.
//!
//! [`evaluate_thresholds`] is a pure function over one log; [`derive_logs`]
//! runs it once per entry in ascending date order, carrying the last known
//! weight forward, and freezes the result on the record.

use crate::models::{
    AlertItem, AlertSource, DailyLogRecord, LogEntry, MetricKey, Severity, ThresholdSettings,
};

const DEFAULT_LOG_LIMIT: usize = 200;

/// Weight loss at or beyond `warn × ESCALATION` becomes critical.
const WEIGHT_LOSS_ESCALATION: f64 = 1.5;

fn severity_by_gap_ratio(ratio: f64) -> Severity {
    if ratio >= 0.5 {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

/// Evaluate one fully-populated log against the configured thresholds.
///
/// Emits at most one alert per metric. Metrics with absent values are
/// skipped entirely, so quick-text logs without structured numbers produce
/// no threshold alerts.
pub fn evaluate_thresholds(
    log: &DailyLogRecord,
    thresholds: &ThresholdSettings,
    previous_weight_lb: Option<f64>,
    source: AlertSource,
) -> Vec<AlertItem> {
    let mut alerts = Vec::new();

    if let Some(water) = log.water_intake_oz {
        if water < thresholds.water_intake_min_oz {
            let gap = (thresholds.water_intake_min_oz - water) / thresholds.water_intake_min_oz.max(1.0);
            alerts.push(AlertItem {
                severity: severity_by_gap_ratio(gap),
                metric: MetricKey::WaterIntakeOz,
                message: format!(
                    "Water intake {} oz is below {} oz threshold.",
                    water, thresholds.water_intake_min_oz
                ),
                date: log.date.clone(),
                source,
            });
        }
    }

    if let Some(appetite) = log.appetite_score {
        if appetite < thresholds.appetite_min {
            alerts.push(AlertItem {
                severity: if appetite <= 1.0 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                metric: MetricKey::AppetiteScore,
                message: format!(
                    "Appetite score {} is below {}.",
                    appetite, thresholds.appetite_min
                ),
                date: log.date.clone(),
                source,
            });
        }
    }

    if let Some(energy) = log.energy_score {
        if energy < thresholds.energy_min {
            alerts.push(AlertItem {
                severity: if energy <= 1.0 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                metric: MetricKey::EnergyScore,
                message: format!("Energy score {} is below {}.", energy, thresholds.energy_min),
                date: log.date.clone(),
                source,
            });
        }
    }

    if let Some(vomiting) = log.vomiting_count {
        if vomiting > thresholds.vomiting_max {
            alerts.push(AlertItem {
                severity: if vomiting >= thresholds.vomiting_max + 2.0 {
                    Severity::Critical
                } else {
                    Severity::Warning
                },
                metric: MetricKey::VomitingCount,
                message: format!(
                    "Vomiting count {} exceeds {}.",
                    vomiting, thresholds.vomiting_max
                ),
                date: log.date.clone(),
                source,
            });
        }
    }

    if let Some(urination) = log.urination_score {
        if urination < thresholds.urination_min {
            alerts.push(AlertItem {
                severity: Severity::Warning,
                metric: MetricKey::UrinationScore,
                message: format!(
                    "Urination score {} is below {}.",
                    urination, thresholds.urination_min
                ),
                date: log.date.clone(),
                source,
            });
        }
    }

    if let Some(stool) = log.stool_score {
        if stool < thresholds.stool_min {
            alerts.push(AlertItem {
                severity: Severity::Warning,
                metric: MetricKey::StoolScore,
                message: format!("Stool score {} is below {}.", stool, thresholds.stool_min),
                date: log.date.clone(),
                source,
            });
        }
    }

    if let (Some(previous), Some(current)) = (previous_weight_lb, log.weight_lb) {
        if previous > 0.0 {
            let loss_pct = (previous - current) / previous * 100.0;
            if loss_pct >= thresholds.weight_loss_pct_warn {
                alerts.push(AlertItem {
                    severity: if loss_pct >= thresholds.weight_loss_pct_warn * WEIGHT_LOSS_ESCALATION {
                        Severity::Critical
                    } else {
                        Severity::Warning
                    },
                    metric: MetricKey::WeightLb,
                    message: format!(
                        "Weight dropped by {:.1}% compared with prior log.",
                        loss_pct
                    ),
                    date: log.date.clone(),
                    source,
                });
            }
        }
    }

    alerts
}

fn normalize_entry(entry: &LogEntry) -> DailyLogRecord {
    DailyLogRecord {
        id: entry.id.clone(),
        date: entry.date.clone(),
        mode: entry.mode,
        created_by: entry.created_by.clone(),
        created_at: entry.created_at.clone(),
        updated_at: entry.updated_at.clone(),
        medications: entry.medications.clone(),
        water_intake_oz: entry.water_intake_oz,
        appetite_score: entry.appetite_score,
        energy_score: entry.energy_score,
        vomiting_count: entry.vomiting_count,
        urination_score: entry.urination_score,
        stool_score: entry.stool_score,
        weight_lb: entry.weight_lb,
        notes: entry.notes.clone(),
        alerts: Vec::new(),
    }
}

/// True when every structured metric required by the evaluator is present.
fn is_evaluable(log: &DailyLogRecord) -> bool {
    log.water_intake_oz.is_some()
        && log.appetite_score.is_some()
        && log.energy_score.is_some()
        && log.vomiting_count.is_some()
        && log.urination_score.is_some()
        && log.stool_score.is_some()
}

/// Normalize content entries into annotated records.
///
/// Entries are processed in ascending (date, updated_at) order so that the
/// weight-loss check always compares against the immediately preceding
/// known weight. The returned list is sorted descending for consumers.
pub fn derive_logs(entries: &[LogEntry], thresholds: &ThresholdSettings) -> Vec<DailyLogRecord> {
    let mut records: Vec<DailyLogRecord> = entries.iter().map(normalize_entry).collect();
    records.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.updated_at.cmp(&b.updated_at))
    });

    let mut previous_weight_lb: Option<f64> = None;
    for record in &mut records {
        record.alerts = if is_evaluable(record) {
            evaluate_thresholds(record, thresholds, previous_weight_lb, AlertSource::ThresholdDefault)
        } else {
            Vec::new()
        };

        if record.weight_lb.is_some() {
            previous_weight_lb = record.weight_lb;
        }
    }

    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
    records
}

/// Logs within the optional `[from, to]` bounds, truncated to `limit`.
pub fn filter_logs<'a>(
    logs: &'a [DailyLogRecord],
    from: Option<&str>,
    to: Option<&str>,
    limit: Option<usize>,
) -> Vec<&'a DailyLogRecord> {
    logs.iter()
        .filter(|log| {
            if let Some(from) = from {
                if log.date.as_str() < from {
                    return false;
                }
            }
            if let Some(to) = to {
                if log.date.as_str() > to {
                    return false;
                }
            }
            true
        })
        .take(limit.unwrap_or(DEFAULT_LOG_LIMIT))
        .collect()
}

/// Most recent alerts across all logs, newest first, truncated to `limit`.
pub fn current_alerts(logs: &[DailyLogRecord], limit: usize) -> Vec<AlertItem> {
    let mut flattened: Vec<AlertItem> = logs.iter().flat_map(|log| log.alerts.clone()).collect();
    flattened.sort_by(|a, b| b.date.cmp(&a.date));
    flattened.truncate(limit);
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogMode;

    fn full_log(date: &str, values: [f64; 6], weight_lb: Option<f64>) -> DailyLogRecord {
        DailyLogRecord {
            id: format!("log-{date}"),
            date: date.to_string(),
            mode: LogMode::Full,
            created_by: "test".to_string(),
            created_at: format!("{date}T09:00:00Z"),
            updated_at: format!("{date}T09:00:00Z"),
            medications: Vec::new(),
            water_intake_oz: Some(values[0]),
            appetite_score: Some(values[1]),
            energy_score: Some(values[2]),
            vomiting_count: Some(values[3]),
            urination_score: Some(values[4]),
            stool_score: Some(values[5]),
            weight_lb,
            notes: None,
            alerts: Vec::new(),
        }
    }

    fn thresholds() -> ThresholdSettings {
        ThresholdSettings::default()
    }

    #[test]
    fn healthy_values_produce_no_alerts() {
        let log = full_log("2026-02-23", [15.0, 4.0, 4.0, 0.0, 2.0, 2.0], None);
        let alerts = evaluate_thresholds(&log, &thresholds(), Some(12.0), AlertSource::ThresholdDefault);
        assert!(alerts.is_empty());
    }

    #[test]
    fn violations_escalate_per_metric_rules() {
        let log = full_log("2026-02-24", [6.0, 1.0, 1.0, 3.0, 0.0, 0.0], Some(10.8));
        let alerts = evaluate_thresholds(&log, &thresholds(), Some(12.0), AlertSource::ThresholdDefault);

        let by_metric = |metric: MetricKey| alerts.iter().find(|a| a.metric == metric).unwrap();

        // Shortfall of 6 oz against a 12 oz minimum is exactly half.
        assert_eq!(by_metric(MetricKey::WaterIntakeOz).severity, Severity::Critical);
        assert_eq!(by_metric(MetricKey::AppetiteScore).severity, Severity::Critical);
        assert_eq!(by_metric(MetricKey::EnergyScore).severity, Severity::Critical);
        // 3 events against a max of 1 exceeds max + 2.
        assert_eq!(by_metric(MetricKey::VomitingCount).severity, Severity::Critical);
        assert_eq!(by_metric(MetricKey::UrinationScore).severity, Severity::Warning);
        assert_eq!(by_metric(MetricKey::StoolScore).severity, Severity::Warning);
        // 10% loss against a 5% warn threshold reaches the 1.5x escalation.
        assert_eq!(by_metric(MetricKey::WeightLb).severity, Severity::Critical);
        assert_eq!(alerts.len(), 7);
    }

    #[test]
    fn weight_loss_below_escalation_is_a_warning() {
        let log = full_log("2026-02-24", [15.0, 4.0, 4.0, 0.0, 2.0, 2.0], Some(11.3));
        let alerts = evaluate_thresholds(&log, &thresholds(), Some(12.0), AlertSource::ThresholdDefault);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, MetricKey::WeightLb);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn missing_weight_skips_the_weight_check() {
        let log = full_log("2026-02-24", [15.0, 4.0, 4.0, 0.0, 2.0, 2.0], None);
        let alerts = evaluate_thresholds(&log, &thresholds(), Some(12.0), AlertSource::ThresholdDefault);
        assert!(alerts.is_empty());
    }

    fn entry(date: &str, weight_lb: Option<f64>) -> LogEntry {
        LogEntry {
            id: format!("entry-{date}"),
            date: date.to_string(),
            mode: LogMode::Full,
            created_by: "test".to_string(),
            created_at: format!("{date}T09:00:00Z"),
            updated_at: format!("{date}T09:00:00Z"),
            medications: Vec::new(),
            water_intake_oz: Some(15.0),
            appetite_score: Some(4.0),
            energy_score: Some(4.0),
            vomiting_count: Some(0.0),
            urination_score: Some(2.0),
            stool_score: Some(2.0),
            weight_lb,
            notes: None,
        }
    }

    #[test]
    fn derive_logs_carries_weight_forward_and_sorts_descending() {
        let entries = vec![
            entry("2026-02-20", Some(12.0)),
            entry("2026-02-21", None),
            entry("2026-02-22", Some(10.8)),
        ];

        let records = derive_logs(&entries, &thresholds());
        assert_eq!(records[0].date, "2026-02-22");
        assert_eq!(records[2].date, "2026-02-20");

        // 2026-02-22 compares against the 2026-02-20 weight across the gap day.
        let latest = &records[0];
        assert_eq!(latest.alerts.len(), 1);
        assert_eq!(latest.alerts[0].metric, MetricKey::WeightLb);
        assert_eq!(latest.alerts[0].severity, Severity::Critical);

        let gap_day = &records[1];
        assert!(gap_day.alerts.is_empty());
    }

    #[test]
    fn quick_text_entries_are_not_evaluated() {
        let mut quick = entry("2026-02-20", Some(9.0));
        quick.mode = LogMode::QuickText;
        quick.water_intake_oz = None;

        let records = derive_logs(&[quick], &thresholds());
        assert!(records[0].alerts.is_empty());
    }

    #[test]
    fn filter_logs_honors_bounds_and_limit() {
        let records = derive_logs(
            &[
                entry("2026-02-20", None),
                entry("2026-02-21", None),
                entry("2026-02-22", None),
            ],
            &thresholds(),
        );

        let filtered = filter_logs(&records, Some("2026-02-21"), Some("2026-02-22"), None);
        assert_eq!(filtered.len(), 2);

        let limited = filter_logs(&records, None, None, Some(1));
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].date, "2026-02-22");
    }
}
