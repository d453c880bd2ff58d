//! Symptom lexicon terms used by the mention extractor.

use serde::{Deserialize, Serialize};

/// One lexicon phrase mapped to a semantic issue.
///
/// Multiple terms may share an `issue_key` (many phrasings of "vomiting").
/// Terms are immutable once loaded; `normalized_phrase` is filled in at load
/// time with the same normalizer applied to free text, which guarantees
/// phrase/text comparability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconTerm {
    pub id: String,
    pub issue_key: String,
    pub label: String,
    pub phrase: String,
    #[serde(default)]
    pub normalized_phrase: String,
    /// Relative weight, 0.5–3.0.
    pub weight: f64,
    pub is_active: bool,
}

/// Issue key the hybrid alert engine watches for vomiting spikes.
pub const VOMITING_ISSUE_KEY: &str = "vomiting";

/// Issue key the hybrid alert engine watches for appetite crises.
pub const LOW_APPETITE_ISSUE_KEY: &str = "low-appetite";

/// Seed lexicon covering the core CKD symptom vocabulary.
pub fn seed_issue_terms() -> Vec<LexiconTerm> {
    let seeds: &[(&str, &str, &str, f64)] = &[
        ("low-appetite", "Low Appetite", "low appetite", 1.2),
        ("low-appetite", "Low Appetite", "not eating", 1.3),
        ("low-appetite", "Low Appetite", "reduced appetite", 1.1),
        ("vomiting", "Vomiting", "vomiting", 1.5),
        ("vomiting", "Vomiting", "throwing up", 1.6),
        ("nausea", "Nausea", "nausea", 1.2),
        ("lethargy", "Lethargy", "low energy", 1.3),
        ("lethargy", "Lethargy", "very low energy", 1.5),
        ("lethargy", "Lethargy", "lethargic", 1.4),
        ("dehydration-risk", "Dehydration Risk", "not drinking", 1.5),
        ("dehydration-risk", "Dehydration Risk", "dehydrated", 1.6),
        ("urination-change", "Urination Change", "less urine", 1.2),
        ("urination-change", "Urination Change", "increased urination", 1.1),
        ("stool-change", "Stool Change", "diarrhea", 1.3),
        ("stool-change", "Stool Change", "constipation", 1.3),
        ("pain-discomfort", "Pain or Discomfort", "pain", 1.4),
        ("pain-discomfort", "Pain or Discomfort", "uncomfortable", 1.2),
    ];

    seeds
        .iter()
        .map(|(issue_key, label, phrase, weight)| LexiconTerm {
            id: format!("seed-{}", phrase.replace(' ', "-")),
            issue_key: (*issue_key).to_string(),
            label: (*label).to_string(),
            phrase: (*phrase).to_string(),
            normalized_phrase: crate::nlp::normalize_phrase(phrase),
            weight: *weight,
            is_active: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_terms_are_active_and_normalized() {
        let terms = seed_issue_terms();
        assert!(!terms.is_empty());
        for term in &terms {
            assert!(term.is_active);
            assert_eq!(term.normalized_phrase, crate::nlp::normalize_phrase(&term.phrase));
            assert!(term.weight >= 0.5 && term.weight <= 3.0);
        }
    }

    #[test]
    fn seed_ids_are_unique() {
        let terms = seed_issue_terms();
        let mut ids: Vec<_> = terms.iter().map(|term| term.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), terms.len());
    }
}
