//! Content document loading and the derived-content cache.
//!
//! Content lives as four JSON documents in one directory. Loading is the
//! only fallible surface of the crate; every derivation downstream works on
//! plain values.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::alerts::derive_logs;
use crate::models::{
    seed_issue_terms, ClinicalEvent, DailyLogRecord, LexiconTerm, LogEntry, ThresholdSettings,
};
use crate::nlp::normalize_phrase;

pub const MEDICAL_LOGS_FILE: &str = "medical_logs.json";
pub const LEXICON_FILE: &str = "lexicon.json";
pub const THRESHOLDS_FILE: &str = "thresholds.json";
pub const CLINICAL_EVENTS_FILE: &str = "clinical-events.json";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MedicalLogsFile {
    logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LexiconFile {
    terms: Vec<LexiconTerm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThresholdsFile {
    thresholds: ThresholdSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClinicalEventsFile {
    events: Vec<ClinicalEvent>,
}

/// Raw content as it sits on disk, with lexicon phrases normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedContent {
    pub logs: Vec<LogEntry>,
    pub lexicon_terms: Vec<LexiconTerm>,
    pub thresholds: ThresholdSettings,
    pub clinical_events: Vec<ClinicalEvent>,
}

/// Content after the one-time derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedContent {
    /// Normalized, alert-annotated logs, newest first.
    pub medical_logs: Vec<DailyLogRecord>,
    pub lexicon_terms: Vec<LexiconTerm>,
    pub thresholds: ThresholdSettings,
    pub clinical_events: Vec<ClinicalEvent>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the four content documents from `dir`.
///
/// Lexicon phrases get their normalized form filled here; an empty term
/// list falls back to the built-in seed lexicon.
pub fn load_content(dir: &Path) -> Result<LoadedContent, ContentError> {
    let logs_file: MedicalLogsFile = read_json(&dir.join(MEDICAL_LOGS_FILE))?;
    let lexicon_file: LexiconFile = read_json(&dir.join(LEXICON_FILE))?;
    let thresholds_file: ThresholdsFile = read_json(&dir.join(THRESHOLDS_FILE))?;
    let events_file: ClinicalEventsFile = read_json(&dir.join(CLINICAL_EVENTS_FILE))?;

    let lexicon_terms = if lexicon_file.terms.is_empty() {
        seed_issue_terms()
    } else {
        lexicon_file
            .terms
            .into_iter()
            .map(|mut term| {
                term.normalized_phrase = normalize_phrase(&term.phrase);
                term
            })
            .collect()
    };

    debug!(
        logs = logs_file.logs.len(),
        terms = lexicon_terms.len(),
        events = events_file.events.len(),
        "content loaded"
    );

    Ok(LoadedContent {
        logs: logs_file.logs,
        lexicon_terms,
        thresholds: thresholds_file.thresholds,
        clinical_events: events_file.events,
    })
}

impl LoadedContent {
    /// Run the one-time derivation pass (log normalization + alert
    /// annotation).
    pub fn derive(&self) -> DerivedContent {
        DerivedContent {
            medical_logs: derive_logs(&self.logs, &self.thresholds),
            lexicon_terms: self.lexicon_terms.clone(),
            thresholds: self.thresholds.clone(),
            clinical_events: self.clinical_events.clone(),
        }
    }
}

/// Explicit derived-content cache.
///
/// The host owns the cache and decides when to invalidate; nothing here
/// watches the filesystem. A poisoned lock is recovered rather than
/// propagated since the cached value is replaceable.
#[derive(Debug, Default)]
pub struct ContentCache {
    derived: Mutex<Option<Arc<DerivedContent>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached derived content, loading from `dir` on first use.
    pub fn get_or_load(&self, dir: &Path) -> Result<Arc<DerivedContent>, ContentError> {
        let mut slot = self
            .derived
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let derived = Arc::new(load_content(dir)?.derive());
        *slot = Some(Arc::clone(&derived));
        Ok(derived)
    }

    /// Drop the cached value; the next `get_or_load` re-reads from disk.
    pub fn invalidate(&self) {
        let mut slot = self
            .derived
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        debug!("content cache invalidated");
    }

    /// Invalidate and reload in one step.
    pub fn refresh(&self, dir: &Path) -> Result<Arc<DerivedContent>, ContentError> {
        self.invalidate();
        self.get_or_load(dir)
    }
}
