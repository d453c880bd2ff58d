//! Golden scenario tests for the derivation engine.
//!
//! Each case fixes a small content set and a window anchor, then checks the
//! derived values a dashboard would actually show.

use carelog_core::alerts::{derive_logs, evaluate_thresholds};
use carelog_core::hybrid::{derive_hybrid_alerts, TriggerId};
use carelog_core::insights::derive_weighted_issue_series;
use carelog_core::models::{
    seed_issue_terms, AlertSource, ClinicalConfidence, ClinicalEvent, ClinicalEventCategory,
    ClinicalEventSource, ClinicalMeasurement, Comparator, LexiconTerm, LogEntry, LogMode,
    MetricKey, Severity, ThresholdSettings,
};
use carelog_core::nlp::extract_issue_mentions;
use carelog_core::stability::derive_weight_delta;
use carelog_core::window::RangeWindow;
use carelog_core::zones::{derive_higher_worse_panel, MappingKind, Zone};
use chrono::NaiveDate;

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()
}

fn entry(id: &str, date: &str, notes: Option<&str>, weight_lb: Option<f64>) -> LogEntry {
    LogEntry {
        id: id.to_string(),
        date: date.to_string(),
        mode: LogMode::QuickText,
        created_by: "caregiver".to_string(),
        created_at: format!("{date}T08:00:00Z"),
        updated_at: format!("{date}T08:00:00Z"),
        medications: Vec::new(),
        water_intake_oz: None,
        appetite_score: None,
        energy_score: None,
        vomiting_count: None,
        urination_score: None,
        stool_score: None,
        weight_lb,
        notes: notes.map(str::to_string),
    }
}

fn lab_event(id: &str, date: &str, key: &str, value: f64) -> ClinicalEvent {
    ClinicalEvent {
        id: id.to_string(),
        date: date.to_string(),
        category: ClinicalEventCategory::Lab,
        title: "Renal recheck".to_string(),
        summary: "Bloodwork drawn at the specialist.".to_string(),
        source: ClinicalEventSource::SpecialistSummary,
        confidence: ClinicalConfidence::Confirmed,
        measurements: vec![ClinicalMeasurement {
            key: key.to_string(),
            label: key.to_string(),
            value,
            unit: Some("mg/dL".to_string()),
            comparator: Comparator::Exact,
            confidence: ClinicalConfidence::Confirmed,
            note: None,
        }],
    }
}

// === Mention extraction scenarios ===

struct MentionCase {
    id: &'static str,
    notes: &'static str,
    expected_issue: Option<&'static str>,
    expected_score: f64,
}

#[test]
fn mention_extraction_golden_cases() {
    let terms = seed_issue_terms();
    let cases = vec![
        MentionCase {
            id: "negated-everything",
            notes: "No vomiting and not low appetite today.",
            expected_issue: None,
            expected_score: 0.0,
        },
        MentionCase {
            id: "longest-phrase-wins",
            notes: "Momoo had very low energy this afternoon.",
            expected_issue: Some("lethargy"),
            expected_score: 1.5,
        },
        MentionCase {
            id: "single-vomiting-hit",
            notes: "She was throwing up around 6am.",
            expected_issue: Some("vomiting"),
            expected_score: 1.6,
        },
        MentionCase {
            id: "negation-is-backward-only",
            notes: "Vomiting again, but no diarrhea.",
            expected_issue: Some("vomiting"),
            expected_score: 1.5,
        },
    ];

    for case in cases {
        let mentions = extract_issue_mentions(case.notes, &terms);
        match case.expected_issue {
            None => assert!(mentions.is_empty(), "case {}", case.id),
            Some(issue) => {
                let top = mentions
                    .iter()
                    .find(|m| m.issue_key == issue)
                    .unwrap_or_else(|| panic!("case {}: issue {issue} missing", case.id));
                assert_eq!(top.weighted_score, case.expected_score, "case {}", case.id);
            }
        }
    }
}

// === Threshold scenario from the monitoring defaults ===

#[test]
fn threshold_escalation_scenario() {
    let thresholds = ThresholdSettings::default();
    let entries = vec![LogEntry {
        water_intake_oz: Some(5.0),
        appetite_score: Some(1.0),
        energy_score: Some(3.0),
        vomiting_count: Some(3.0),
        urination_score: Some(2.0),
        stool_score: Some(2.0),
        ..entry("log-1", "2026-02-24", None, Some(9.0))
    }];

    let logs = derive_logs(&entries, &thresholds);
    let alerts = &logs[0].alerts;

    let by_metric = |metric: MetricKey| alerts.iter().find(|a| a.metric == metric);

    // Water 5 oz vs min 12: shortfall 7 > 6 (half of min) → critical.
    assert_eq!(
        by_metric(MetricKey::WaterIntakeOz).map(|a| a.severity),
        Some(Severity::Critical)
    );
    // Appetite 1 ≤ 1 → critical.
    assert_eq!(
        by_metric(MetricKey::AppetiteScore).map(|a| a.severity),
        Some(Severity::Critical)
    );
    // Energy 3 above min 2 → no alert.
    assert!(by_metric(MetricKey::EnergyScore).is_none());
    // Vomiting 3 ≥ max 1 + 2 → critical.
    assert_eq!(
        by_metric(MetricKey::VomitingCount).map(|a| a.severity),
        Some(Severity::Critical)
    );
    // No prior weight, so no weight-loss alert on the first log.
    assert!(by_metric(MetricKey::WeightLb).is_none());
}

#[test]
fn weight_loss_alert_uses_prior_day_weight() {
    let thresholds = ThresholdSettings::default();
    let full = |id: &str, date: &str, weight: f64| LogEntry {
        water_intake_oz: Some(14.0),
        appetite_score: Some(3.0),
        energy_score: Some(3.0),
        vomiting_count: Some(0.0),
        urination_score: Some(2.0),
        stool_score: Some(2.0),
        ..entry(id, date, None, Some(weight))
    };
    let entries = vec![full("l1", "2026-02-23", 10.0), full("l2", "2026-02-24", 9.0)];

    let logs = derive_logs(&entries, &thresholds);
    let latest = logs.iter().find(|log| log.date == "2026-02-24").unwrap();
    let weight_alert = latest
        .alerts
        .iter()
        .find(|a| a.metric == MetricKey::WeightLb)
        .unwrap();

    // 10% loss ≥ 1.5 × 5% warn threshold → critical.
    assert_eq!(weight_alert.severity, Severity::Critical);
    assert_eq!(weight_alert.source, AlertSource::ThresholdDefault);
    assert!(weight_alert.message.contains("10.0%"));
}

// === Weight delta scenario ===

#[test]
fn weight_delta_scenario_minus_one_pound() {
    let thresholds = ThresholdSettings::default();
    let entries = vec![
        entry("l1", "2026-02-10", None, Some(10.0)),
        entry("l2", "2026-02-24", None, Some(9.0)),
    ];
    let logs = derive_logs(&entries, &thresholds);

    let delta = derive_weight_delta(&logs, 7, anchor());
    assert_eq!(delta.latest_weight_lb, Some(9.0));
    assert_eq!(delta.baseline_weight_lb, Some(10.0));
    assert_eq!(delta.delta_lb, Some(-1.0));
    assert_eq!(delta.delta_pct, Some(-10.0));
}

// === Clinical staging scenario ===

#[test]
fn creatinine_5_6_lands_in_stage_4() {
    let events = vec![lab_event("e1", "2026-02-20", "creatinine", 5.6)];
    let window = RangeWindow::ending_at(30, anchor());
    let panel = derive_higher_worse_panel(&events, &window);

    let row = panel
        .rows
        .iter()
        .find(|row| row.metric_key == "creatinine")
        .unwrap();
    assert_eq!(row.severity_zone, Zone::Stage4);
    assert_eq!(row.severity_label, "Stage 4");
    assert_eq!(row.mapping_kind, MappingKind::IrisStaged);
    assert!(!row.stale);
}

// === Hybrid alert dedup scenario ===

#[test]
fn hybrid_alerts_dedup_and_sort() {
    let thresholds = ThresholdSettings::default();
    let entries = vec![
        entry("l1", "2026-02-20", Some("Blood on her gums this morning."), None),
        entry("l2", "2026-02-23", Some("More blood near the mouth again."), None),
        entry(
            "l3",
            "2026-02-24",
            Some("Chewing problems, keeps spitting her pill out."),
            None,
        ),
    ];
    let logs = derive_logs(&entries, &thresholds);
    let window = RangeWindow::ending_at(7, anchor());

    let chips = derive_hybrid_alerts(&logs, &seed_issue_terms(), &window);

    let bleeding: Vec<_> = chips
        .iter()
        .filter(|c| c.trigger_id == Some(TriggerId::OralBleeding))
        .collect();
    assert_eq!(bleeding.len(), 1, "one chip per trigger");
    assert_eq!(bleeding[0].date, "2026-02-23");

    // Newest dates first; ties put critical chips ahead of warnings.
    let dates: Vec<&str> = chips.iter().map(|c| c.date.as_str()).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}

// === Determinism across the weighted issue pipeline ===

#[test]
fn weighted_issue_series_is_deterministic_and_dense() {
    let thresholds = ThresholdSettings::default();
    let entries = vec![
        entry("l1", "2026-02-21", Some("Vomiting twice, lethargic all day."), None),
        entry("l2", "2026-02-23", Some("Low appetite, some nausea."), None),
    ];
    let logs = derive_logs(&entries, &thresholds);
    let terms: Vec<LexiconTerm> = seed_issue_terms();
    let window = RangeWindow::ending_at(7, anchor());

    let first = derive_weighted_issue_series(&logs, &terms, &window, 5);
    let second = derive_weighted_issue_series(&logs, &terms, &window, 5);
    assert_eq!(first, second);

    assert_eq!(first.daily_series.len(), 7);
    assert_eq!(first.analyzed_logs, 2);
    assert!(!first.rank.is_empty());
    for point in &first.daily_series {
        assert_eq!(point.scores.len(), first.rank.len());
    }
}

// === Defensive defaults ===

#[test]
fn missing_metrics_skip_their_checks() {
    let thresholds = ThresholdSettings::default();
    let sparse = derive_logs(&[entry("l1", "2026-02-24", Some("quiet day"), None)], &thresholds);
    assert!(sparse[0].alerts.is_empty());

    let alerts = evaluate_thresholds(&sparse[0], &thresholds, None, AlertSource::ThresholdOverride);
    assert!(alerts.is_empty());
}
