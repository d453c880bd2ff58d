//! Carelog Core Library
//!
//! Deterministic derivation engine for a chronic-illness (feline CKD)
//! monitoring dashboard: caregiver free-text logs and clinical measurements
//! in, ranked issue signals, alert chips and severity zones out.
//!
//! # Architecture
//!
//! ```text
//! content/*.json ──► load_content ──► derive_logs (threshold alerts, once)
//!                                          │
//!                              DerivedContent (cached)
//!                                          │
//!           ┌──────────────┬───────────────┼───────────────┬─────────────┐
//!           ▼              ▼               ▼               ▼             ▼
//!      nlp mentions   issue rank /    burden index    weight delta   clinical
//!      (lexicon +     daily series    (90-day peak    consistency    zone panels
//!       negation)                      normalized)                   (IRIS/relative)
//!           │              │               │               │             │
//!           └──────────────┴───────┬───────┴───────────────┴─────────────┘
//!                                  ▼
//!                         derive_mainboard
//!                      (one payload per range)
//! ```
//!
//! # Core Principle
//!
//! **Derivations are pure.** Every operation takes an explicit anchor date
//! and returns plain values; bad inputs degrade to defensive defaults
//! instead of errors. Only content loading is fallible.
//!
//! # Modules
//!
//! - [`models`]: Domain types (DailyLogRecord, LexiconTerm, ClinicalEvent, ...)
//! - [`window`]: Inclusive calendar-date range windows
//! - [`nlp`]: Lexicon-based issue mention extraction with negation handling
//! - [`alerts`]: Threshold alert evaluation and log normalization
//! - [`insights`]: Window-scoped mention aggregation and weighted ranking
//! - [`hybrid`]: Curated note-pattern triggers merged with threshold chips
//! - [`burden`]: Symptom burden index against a 90-day rolling peak
//! - [`stability`]: Weight delta and logging-consistency stats
//! - [`zones`]: IRIS-staged and percentile-relative clinical severity zones
//! - [`dashboard`]: Mainboard payload assembly
//! - [`content`]: Content document loading and the derived-content cache

pub mod alerts;
pub mod burden;
pub mod content;
pub mod dashboard;
pub mod hybrid;
pub mod insights;
pub mod models;
pub mod nlp;
pub mod stability;
pub mod window;
pub mod zones;

mod num;
#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use alerts::{derive_logs, filter_logs};
pub use content::{load_content, ContentCache, ContentError, DerivedContent, LoadedContent};
pub use dashboard::{derive_mainboard, MainboardPayload};
pub use hybrid::{derive_hybrid_alerts, HybridAlertChip, TriggerId};
pub use models::{
    AlertItem, ClinicalEvent, DailyLogRecord, LexiconTerm, LogEntry, MetricKey, Severity,
    ThresholdSettings,
};
pub use nlp::{extract_issue_mentions, ExtractedIssueMention};
pub use window::{RangeKey, RangeWindow};
pub use zones::{derive_higher_worse_panel, derive_lower_worse_panel, DirectionalPanel, Zone};
