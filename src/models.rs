use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A model offered for evaluation by the backend catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Stable identifier used in run requests
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// A test scenario offered for evaluation by the backend catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInfo {
    /// Stable identifier used in run requests
    pub id: String,
    /// Display title
    pub title: String,
    /// Optional scenario category
    #[serde(default)]
    pub category: Option<String>,
    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of the run-submission request; one run covers the cross product
/// of the selected models and scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub model_ids: Vec<String>,
    pub scenario_ids: Vec<String>,
}

/// Response to a run submission.
///
/// The backend may answer with an HTTP success status and still set the
/// `error` field, so both the status and the body must be checked.
#[derive(Debug, Clone, Deserialize)]
pub struct RunAccepted {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Quality metrics computed by the backend for one (model, scenario) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Overall quality summary in [0, 1], displayed as a percentage
    pub trust_score: f64,
    #[serde(default)]
    pub hallucinations_found: u32,
    #[serde(default)]
    pub hallucinations_corrected: u32,
}

/// One detected content issue in a model's output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallucinationFinding {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One correction the advisor applied to a model's output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub original: String,
    pub reason: String,
}

/// The model a stored evaluation ran against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRef {
    pub name: String,
}

/// The scenario a stored evaluation ran against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRef {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// A completed evaluation of one model on one scenario.
///
/// Immutable once received. The history endpoint serves these without the
/// full log text; the log is fetched separately via `evaluation_log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: String,
    pub model: ModelRef,
    pub scenario: ScenarioRef,
    pub metrics: Metrics,
    #[serde(default)]
    pub raw_model_output: String,
    #[serde(default)]
    pub advisor_corrected_output: String,
    #[serde(default)]
    pub detailed_hallucination_report: Vec<HallucinationFinding>,
    #[serde(default)]
    pub detailed_corrections_log: Vec<CorrectionEntry>,
    pub timestamp: DateTime<Utc>,
    /// Server-side path of the full evaluation log; may be empty
    #[serde(default)]
    pub evaluation_log: String,
}

/// Progress update for a running evaluation.
///
/// May carry a completed result, a backend error for one pair, or neither
/// (a pure status update). Percentages are not guaranteed monotonic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub progress: f64,
    pub status: String,
    #[serde(default)]
    pub result: Option<EvaluationRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Terminal signal for a run; no further progress events follow it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub message: String,
}

/// Coarse trust-score band used when rendering the history table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustRating {
    Excellent,
    Good,
    Poor,
}

impl TrustRating {
    /// Band a trust score in [0, 1]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            TrustRating::Excellent
        } else if score >= 0.6 {
            TrustRating::Good
        } else {
            TrustRating::Poor
        }
    }

    /// Short label for table output
    pub fn label(self) -> &'static str {
        match self {
            TrustRating::Excellent => "excellent",
            TrustRating::Good => "good",
            TrustRating::Poor => "poor",
        }
    }
}
