//! Clinical event records and their measurements.

use serde::{Deserialize, Serialize};

/// Broad category of a clinical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalEventCategory {
    Historical,
    Lab,
    Exam,
    Er,
    TreatmentPlan,
    HomeObservation,
}

/// Who reported the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalEventSource {
    SpecialistSummary,
    HomeLog,
}

/// Confidence attached to an event or measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalConfidence {
    Confirmed,
    Estimated,
    CaregiverReport,
}

/// How the recorded numeric value relates to the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Exact,
    Approx,
    Gt,
    Lt,
}

impl Comparator {
    /// Display prefix used when rendering a measurement value as text.
    pub fn prefix(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Approx => "~",
            Comparator::Exact => "",
        }
    }
}

/// One measurement attached to a clinical event, keyed by metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalMeasurement {
    pub key: String,
    pub label: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub comparator: Comparator,
    pub confidence: ClinicalConfidence,
    #[serde(default)]
    pub note: Option<String>,
}

/// A dated clinical event with zero or more measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalEvent {
    pub id: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub date: String,
    pub category: ClinicalEventCategory,
    pub title: String,
    pub summary: String,
    pub source: ClinicalEventSource,
    pub confidence: ClinicalConfidence,
    #[serde(default)]
    pub measurements: Vec<ClinicalMeasurement>,
}

impl ClinicalEvent {
    /// Surrounding free text used for context-sensitive staging.
    pub fn context_text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

/// Events sorted ascending by (date, id).
pub fn sort_events_ascending(events: &[ClinicalEvent]) -> Vec<&ClinicalEvent> {
    let mut sorted: Vec<&ClinicalEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Events sorted descending by (date, id).
pub fn sort_events_descending(events: &[ClinicalEvent]) -> Vec<&ClinicalEvent> {
    let mut sorted: Vec<&ClinicalEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    sorted
}
