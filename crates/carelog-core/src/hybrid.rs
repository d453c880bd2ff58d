//! Hybrid alert chips: curated pattern triggers over notes merged with the
//! latest threshold alert per metric.
//!
//! Pattern triggers fire at most once per (trigger, date); the merged list
//! keeps only the most recent chip per trigger so a long window never shows
//! the same concern twice.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{AlertItem, DailyLogRecord, LexiconTerm, MetricKey, Severity};
use crate::models::{LOW_APPETITE_ISSUE_KEY, VOMITING_ISSUE_KEY};
use crate::nlp::extract_issue_mentions;
use crate::window::RangeWindow;

// === Curated trigger patterns ===

static ORAL_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(oral|mouth|tongue|lip|gum|gingiv|saliva|drool|chin)").unwrap()
});

static BLOOD_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(blood|bleed|bleeding|bloody)").unwrap());

static ORAL_DYSFUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(tongue|oral discomfort|kibble avoidance|chew|chewing|pill[^.]{0,20}(refus|spit|intoler|difficult)|pill intolerance|spitting)",
    )
    .unwrap()
});

static APPETITE_CRISIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(not eating|won't eat|wont eat|refus(?:ing|ed)? to eat|stopped eating|no appetite|low appetite)",
    )
    .unwrap()
});

static RESPIRATORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(respir|breath|tachypnea|rr\b|rapid breathing)").unwrap()
});

static RESPIRATORY_STRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(spike|high|rapid|labored|stress|4[0-9])").unwrap());

/// Weighted vomiting score at which a single day counts as a spike.
const VOMITING_SPIKE_SCORE: f64 = 3.0;

/// Mention count at which a single day counts as a vomiting spike.
const VOMITING_SPIKE_COUNT: u32 = 2;

/// Weighted appetite score at which notes escalate to an appetite crisis.
const APPETITE_CRISIS_SCORE: f64 = 2.3;

/// Curated note-pattern trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerId {
    OralBleeding,
    OralDysfunction,
    VomitingSpike,
    AppetiteCrisis,
    RespiratoryStress,
}

impl TriggerId {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerId::OralBleeding => "oral_bleeding",
            TriggerId::OralDysfunction => "oral_dysfunction",
            TriggerId::VomitingSpike => "vomiting_spike",
            TriggerId::AppetiteCrisis => "appetite_crisis",
            TriggerId::RespiratoryStress => "respiratory_stress",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TriggerId::OralBleeding => "Oral bleeding",
            TriggerId::OralDysfunction => "Oral dysfunction",
            TriggerId::VomitingSpike => "Vomiting spike",
            TriggerId::AppetiteCrisis => "Appetite crisis",
            TriggerId::RespiratoryStress => "Respiratory stress",
        }
    }

    fn severity(self) -> Severity {
        match self {
            TriggerId::OralBleeding => Severity::Critical,
            TriggerId::OralDysfunction => Severity::Warning,
            TriggerId::VomitingSpike => Severity::Critical,
            TriggerId::AppetiteCrisis => Severity::Warning,
            TriggerId::RespiratoryStress => Severity::Critical,
        }
    }

    fn message(self) -> &'static str {
        match self {
            TriggerId::OralBleeding => "Blood and oral-area signs were detected in notes.",
            TriggerId::OralDysfunction => {
                "Oral discomfort or chewing/pill-tolerance issues were detected."
            }
            TriggerId::VomitingSpike => "Vomiting burden exceeded curated spike threshold.",
            TriggerId::AppetiteCrisis => "High appetite concern signals were detected in notes.",
            TriggerId::RespiratoryStress => "Respiratory stress pattern detected in notes.",
        }
    }
}

/// Where a chip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipSource {
    Nlp,
    Threshold,
}

/// One merged alert chip for the dashboard strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridAlertChip {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<TriggerId>,
    pub severity: Severity,
    pub label: String,
    pub message: String,
    pub date: String,
    pub source: ChipSource,
}

fn trigger_chip(trigger: TriggerId, date: &str) -> HybridAlertChip {
    HybridAlertChip {
        id: format!("nlp-{}-{date}", trigger.as_str()),
        trigger_id: Some(trigger),
        severity: trigger.severity(),
        label: trigger.label().to_string(),
        message: trigger.message().to_string(),
        date: date.to_string(),
        source: ChipSource::Nlp,
    }
}

/// Latest threshold alert per metric; a same-date critical replaces a
/// warning.
fn latest_by_metric(alerts: Vec<&AlertItem>) -> Vec<HybridAlertChip> {
    let mut by_metric: HashMap<MetricKey, &AlertItem> = HashMap::new();
    for alert in alerts {
        let replace = match by_metric.get(&alert.metric) {
            None => true,
            Some(current) => {
                alert.date > current.date
                    || (alert.date == current.date && alert.severity == Severity::Critical)
            }
        };
        if replace {
            by_metric.insert(alert.metric, alert);
        }
    }

    by_metric
        .into_values()
        .map(|alert| HybridAlertChip {
            id: format!("threshold-{}-{}", alert.metric.as_str(), alert.date),
            trigger_id: None,
            severity: alert.severity,
            label: alert.metric.label().to_string(),
            message: alert.message.clone(),
            date: alert.date.clone(),
            source: ChipSource::Threshold,
        })
        .collect()
}

fn triggers_for_notes(notes: &str, terms: &[LexiconTerm]) -> Vec<TriggerId> {
    let text = notes.to_lowercase();
    let mentions = extract_issue_mentions(notes, terms);
    let vomiting = mentions.iter().find(|m| m.issue_key == VOMITING_ISSUE_KEY);
    let appetite = mentions
        .iter()
        .find(|m| m.issue_key == LOW_APPETITE_ISSUE_KEY);

    let mut fired = Vec::new();

    if BLOOD_TOKEN_RE.is_match(&text) && ORAL_TOKEN_RE.is_match(&text) {
        fired.push(TriggerId::OralBleeding);
    }
    if ORAL_DYSFUNCTION_RE.is_match(&text) {
        fired.push(TriggerId::OralDysfunction);
    }
    let vomiting_score = vomiting.map(|m| m.weighted_score).unwrap_or(0.0);
    let vomiting_count = vomiting.map(|m| m.mention_count).unwrap_or(0);
    if vomiting_score >= VOMITING_SPIKE_SCORE || vomiting_count >= VOMITING_SPIKE_COUNT {
        fired.push(TriggerId::VomitingSpike);
    }
    let appetite_score = appetite.map(|m| m.weighted_score).unwrap_or(0.0);
    if APPETITE_CRISIS_RE.is_match(&text) || appetite_score >= APPETITE_CRISIS_SCORE {
        fired.push(TriggerId::AppetiteCrisis);
    }
    if RESPIRATORY_RE.is_match(&text) && RESPIRATORY_STRESS_RE.is_match(&text) {
        fired.push(TriggerId::RespiratoryStress);
    }

    fired
}

/// Merge curated note triggers with the latest in-window threshold alerts.
///
/// Each trigger surfaces once, on its most recent firing date. The combined
/// list sorts by date descending, then critical before warning, then label
/// ascending.
pub fn derive_hybrid_alerts(
    logs: &[DailyLogRecord],
    terms: &[LexiconTerm],
    window: &RangeWindow,
) -> Vec<HybridAlertChip> {
    let active: Vec<LexiconTerm> = terms.iter().filter(|t| t.is_active).cloned().collect();
    let range_logs: Vec<&DailyLogRecord> = logs
        .iter()
        .filter(|log| window.contains(&log.date))
        .collect();

    let threshold_chips = latest_by_metric(
        range_logs
            .iter()
            .flat_map(|log| log.alerts.iter())
            .filter(|alert| window.contains(&alert.date))
            .collect(),
    );

    let mut per_trigger_day: HashMap<(TriggerId, String), HybridAlertChip> = HashMap::new();
    for log in &range_logs {
        if !log.has_notes() {
            continue;
        }
        let notes = log.notes.as_deref().unwrap_or_default();
        for trigger in triggers_for_notes(notes, &active) {
            per_trigger_day.insert((trigger, log.date.clone()), trigger_chip(trigger, &log.date));
        }
    }

    let mut latest_per_trigger: HashMap<TriggerId, HybridAlertChip> = HashMap::new();
    for ((trigger, _), chip) in per_trigger_day {
        let replace = match latest_per_trigger.get(&trigger) {
            Some(existing) => chip.date > existing.date,
            None => true,
        };
        if replace {
            latest_per_trigger.insert(trigger, chip);
        }
    }

    let mut combined: Vec<HybridAlertChip> = latest_per_trigger.into_values().collect();
    combined.extend(threshold_chips);
    combined.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.severity.rank().cmp(&b.severity.rank()))
            .then_with(|| a.label.cmp(&b.label))
    });
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertSource;
    use crate::test_support::{quick_log, sample_terms};
    use chrono::NaiveDate;

    fn window() -> RangeWindow {
        RangeWindow::ending_at(7, NaiveDate::from_ymd_opt(2026, 2, 25).unwrap())
    }

    fn alert(metric: MetricKey, severity: Severity, date: &str) -> AlertItem {
        AlertItem {
            severity,
            metric,
            message: format!("{} out of range.", metric.as_str()),
            date: date.to_string(),
            source: AlertSource::ThresholdDefault,
        }
    }

    #[test]
    fn oral_bleeding_needs_both_token_families() {
        let logs = vec![
            quick_log("l1", "2026-02-23", Some("Noticed blood on her gums tonight."), None),
            quick_log("l2", "2026-02-24", Some("A bit of blood in the litter box."), None),
        ];
        let chips = derive_hybrid_alerts(&logs, &sample_terms(), &window());

        let bleeding: Vec<&HybridAlertChip> = chips
            .iter()
            .filter(|c| c.trigger_id == Some(TriggerId::OralBleeding))
            .collect();
        assert_eq!(bleeding.len(), 1);
        assert_eq!(bleeding[0].date, "2026-02-23");
        assert_eq!(bleeding[0].severity, Severity::Critical);
        assert_eq!(bleeding[0].id, "nlp-oral_bleeding-2026-02-23");
    }

    #[test]
    fn vomiting_spike_fires_on_repeat_mentions() {
        let logs = vec![quick_log(
            "l1",
            "2026-02-24",
            Some("vomiting in the morning and vomiting again at night"),
            None,
        )];
        let chips = derive_hybrid_alerts(&logs, &sample_terms(), &window());
        assert!(chips
            .iter()
            .any(|c| c.trigger_id == Some(TriggerId::VomitingSpike)));
    }

    #[test]
    fn appetite_crisis_fires_on_phrase_even_without_lexicon_score() {
        let logs = vec![quick_log("l1", "2026-02-24", Some("She refused to eat all day."), None)];
        let chips = derive_hybrid_alerts(&logs, &sample_terms(), &window());
        let crisis = chips
            .iter()
            .find(|c| c.trigger_id == Some(TriggerId::AppetiteCrisis))
            .unwrap();
        assert_eq!(crisis.severity, Severity::Warning);
    }

    #[test]
    fn each_trigger_keeps_only_its_latest_firing() {
        let logs = vec![
            quick_log("l1", "2026-02-21", Some("Rapid breathing and high stress."), None),
            quick_log("l2", "2026-02-24", Some("Labored breathing again tonight."), None),
        ];
        let chips = derive_hybrid_alerts(&logs, &sample_terms(), &window());
        let respiratory: Vec<&HybridAlertChip> = chips
            .iter()
            .filter(|c| c.trigger_id == Some(TriggerId::RespiratoryStress))
            .collect();
        assert_eq!(respiratory.len(), 1);
        assert_eq!(respiratory[0].date, "2026-02-24");
    }

    #[test]
    fn threshold_chips_take_the_latest_alert_per_metric() {
        let mut older = quick_log("l1", "2026-02-21", None, None);
        older.alerts = vec![alert(MetricKey::WaterIntakeOz, Severity::Warning, "2026-02-21")];
        let mut newer = quick_log("l2", "2026-02-24", None, None);
        newer.alerts = vec![alert(MetricKey::WaterIntakeOz, Severity::Warning, "2026-02-24")];

        let chips = derive_hybrid_alerts(&[older, newer], &sample_terms(), &window());
        let water: Vec<&HybridAlertChip> = chips
            .iter()
            .filter(|c| c.source == ChipSource::Threshold)
            .collect();
        assert_eq!(water.len(), 1);
        assert_eq!(water[0].date, "2026-02-24");
        assert_eq!(water[0].label, "Low water intake");
        assert_eq!(water[0].id, "threshold-waterIntakeOz-2026-02-24");
    }

    #[test]
    fn same_date_critical_replaces_warning() {
        let mut log = quick_log("l1", "2026-02-24", None, None);
        log.alerts = vec![
            alert(MetricKey::VomitingCount, Severity::Warning, "2026-02-24"),
            alert(MetricKey::VomitingCount, Severity::Critical, "2026-02-24"),
        ];
        let chips = derive_hybrid_alerts(&[log], &sample_terms(), &window());
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].severity, Severity::Critical);
    }

    #[test]
    fn merged_list_sorts_by_date_then_severity_then_label() {
        let mut with_alert = quick_log("l1", "2026-02-24", Some("Chewing problems, spitting pills."), None);
        with_alert.alerts = vec![alert(MetricKey::EnergyScore, Severity::Critical, "2026-02-24")];
        let chips = derive_hybrid_alerts(&[with_alert], &sample_terms(), &window());

        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].severity, Severity::Critical);
        assert_eq!(chips[0].label, "Low energy");
        assert_eq!(chips[1].trigger_id, Some(TriggerId::OralDysfunction));
    }

    #[test]
    fn out_of_window_logs_never_fire() {
        let logs = vec![quick_log("l1", "2026-01-01", Some("blood on her gums"), None)];
        let chips = derive_hybrid_alerts(&logs, &sample_terms(), &window());
        assert!(chips.is_empty());
    }
}
