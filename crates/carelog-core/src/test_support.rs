//! Shared fixture builders for unit tests.

use crate::models::{DailyLogRecord, LexiconTerm, LogMode};
use crate::nlp::normalize_phrase;

/// Minimal quick-text log record with only the fields under test set.
pub(crate) fn quick_log(
    id: &str,
    date: &str,
    notes: Option<&str>,
    weight_lb: Option<f64>,
) -> DailyLogRecord {
    DailyLogRecord {
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
        alerts: Vec::new(),
    }
}

/// Small two-issue lexicon used across aggregation tests.
pub(crate) fn sample_terms() -> Vec<LexiconTerm> {
    vec![
        LexiconTerm {
            id: "t-vomiting".to_string(),
            issue_key: "vomiting".to_string(),
            label: "Vomiting".to_string(),
            phrase: "vomiting".to_string(),
            normalized_phrase: normalize_phrase("vomiting"),
            weight: 1.5,
            is_active: true,
        },
        LexiconTerm {
            id: "t-low-appetite".to_string(),
            issue_key: "low-appetite".to_string(),
            label: "Low Appetite".to_string(),
            phrase: "low appetite".to_string(),
            normalized_phrase: normalize_phrase("low appetite"),
            weight: 1.2,
            is_active: true,
        },
    ]
}
