//! Daily caregiver log records, threshold settings and threshold alerts.

use serde::{Deserialize, Serialize};

/// How a log entry was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    /// Structured entry with all numeric metrics filled in.
    Full,
    /// Free-text entry; numeric metrics are optional.
    QuickText,
}

/// One medication line inside a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dose: Option<String>,
    pub taken: bool,
}

/// Raw log entry as it appears in the content document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    /// ISO calendar date (`YYYY-MM-DD`).
    pub date: String,
    pub mode: LogMode,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub water_intake_oz: Option<f64>,
    #[serde(default)]
    pub appetite_score: Option<f64>,
    #[serde(default)]
    pub energy_score: Option<f64>,
    #[serde(default)]
    pub vomiting_count: Option<f64>,
    #[serde(default)]
    pub urination_score: Option<f64>,
    #[serde(default)]
    pub stool_score: Option<f64>,
    #[serde(default)]
    pub weight_lb: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Normalized daily log record.
///
/// `alerts` is populated exactly once by [`crate::alerts::derive_logs`] and is
/// never recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogRecord {
    pub id: String,
    pub date: String,
    pub mode: LogMode,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub medications: Vec<Medication>,
    pub water_intake_oz: Option<f64>,
    pub appetite_score: Option<f64>,
    pub energy_score: Option<f64>,
    pub vomiting_count: Option<f64>,
    pub urination_score: Option<f64>,
    pub stool_score: Option<f64>,
    pub weight_lb: Option<f64>,
    pub notes: Option<String>,
    pub alerts: Vec<AlertItem>,
}

impl DailyLogRecord {
    /// True when the record has a non-empty notes body worth analyzing.
    pub fn has_notes(&self) -> bool {
        self.notes
            .as_deref()
            .map(|notes| !notes.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Per-metric minimums/maximums used by the threshold alert evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSettings {
    pub water_intake_min_oz: f64,
    pub appetite_min: f64,
    pub energy_min: f64,
    pub vomiting_max: f64,
    pub urination_min: f64,
    pub stool_min: f64,
    /// Percentage loss vs. prior-day weight that triggers a warning.
    pub weight_loss_pct_warn: f64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            water_intake_min_oz: 12.0,
            appetite_min: 2.0,
            energy_min: 2.0,
            vomiting_max: 1.0,
            urination_min: 1.0,
            stool_min: 1.0,
            weight_loss_pct_warn: 5.0,
        }
    }
}

/// Alert severity. `Critical` outranks `Warning` in every merged ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// Sort rank: critical sorts before warning.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
        }
    }
}

/// Metric checked by the threshold evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    WaterIntakeOz,
    AppetiteScore,
    EnergyScore,
    VomitingCount,
    UrinationScore,
    StoolScore,
    WeightLb,
}

impl MetricKey {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::WaterIntakeOz => "waterIntakeOz",
            MetricKey::AppetiteScore => "appetiteScore",
            MetricKey::EnergyScore => "energyScore",
            MetricKey::VomitingCount => "vomitingCount",
            MetricKey::UrinationScore => "urinationScore",
            MetricKey::StoolScore => "stoolScore",
            MetricKey::WeightLb => "weightLb",
        }
    }

    /// Short human label used for alert chips.
    pub fn label(self) -> &'static str {
        match self {
            MetricKey::WaterIntakeOz => "Low water intake",
            MetricKey::AppetiteScore => "Low appetite",
            MetricKey::EnergyScore => "Low energy",
            MetricKey::VomitingCount => "Vomiting increase",
            MetricKey::UrinationScore => "Urination change",
            MetricKey::StoolScore => "Stool change",
            MetricKey::WeightLb => "Weight loss",
        }
    }
}

/// Which configuration produced a threshold alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSource {
    #[serde(rename = "threshold-default")]
    ThresholdDefault,
    #[serde(rename = "threshold-override")]
    ThresholdOverride,
}

/// One threshold violation for one log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertItem {
    pub severity: Severity,
    pub metric: MetricKey,
    pub message: String,
    pub date: String,
    pub source: AlertSource,
}
