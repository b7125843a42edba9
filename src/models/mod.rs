// CodeTriage Data Models
// Migrated from Python Pydantic schemas

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Code Samples ============

/// A single code sample under review. Owned by the caller; never persisted
/// by this library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSample {
    pub text: String,
    #[serde(default)]
    pub filename: Option<String>,
}

impl CodeSample {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: None,
        }
    }

    pub fn with_filename(text: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filename: Some(filename.into()),
        }
    }
}

// ============ Language Detection ============

/// Confidence tier of a language guess. `None` is a valid outcome for
/// ambiguous or empty input, not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionConfidence {
    High,
    Medium,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub language: Option<String>,
    pub confidence: DetectionConfidence,
}

impl DetectionResult {
    pub fn none() -> Self {
        Self {
            language: None,
            confidence: DetectionConfidence::None,
        }
    }
}

// ============ Risk Classification ============

/// Discrete risk tier assigned to a score by a threshold table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub label: String,
    pub description: String,
}

/// Per-sample AI-authorship assessment, built from an AI-likelihood oracle
/// score. `is_ai` is a threshold verdict, independent of the risk label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAssessment {
    pub is_ai: bool,
    pub ai_score: f64,
    pub human_score: f64,
    pub risk_level: String,
    pub risk_description: String,
}

/// Pairwise clone assessment. The risk label and the `is_clone` verdict are
/// two different partitions of the same score: a pair can sit in the
/// "medium" tier and still not be a clone under a high caller threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneAssessment {
    pub is_clone: bool,
    pub clone_probability: f64,
    pub risk_level: String,
    pub risk_description: String,
    pub threshold: f64,
}

// ============ Batch Comparison ============

/// One successfully-scored unordered sample pair (`index_a < index_b`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPair {
    pub index_a: usize,
    pub index_b: usize,
    pub score: f64,
    pub risk_level: String,
    pub risk_description: String,
    pub is_clone: bool,
}

/// A pair whose oracle call failed. Failures are reported, never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairFailure {
    pub index_a: usize,
    pub index_b: usize,
    pub error: String,
}

/// Reduction of a whole batch comparison into one actionable summary.
/// Aggregates (`max_score`, `average_score`, `high_risk_count`) cover only
/// successfully-scored pairs; failed pairs are counted separately so a
/// caller can tell "23 clean pairs" from "23 of 45 scored, 22 failed".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub total_samples: usize,
    pub total_comparisons: usize,
    pub threshold_used: f64,
    pub flagged_pairs: Vec<ComparisonPair>,
    pub max_score: Option<f64>,
    pub average_score: Option<f64>,
    pub high_risk_count: usize,
    pub scored_comparisons: usize,
    pub failed_comparisons: usize,
    #[serde(default)]
    pub failures: Vec<PairFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_sample_serialization() {
        let sample = CodeSample::with_filename("print('hi')", "a.py");
        let json = serde_json::to_string(&sample).unwrap();
        let parsed: CodeSample = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.filename.as_deref(), Some("a.py"));
    }

    #[test]
    fn test_confidence_serializes_snake_case() {
        let json = serde_json::to_string(&DetectionConfidence::High).unwrap();
        assert_eq!(json, "\"high\"");
        let json = serde_json::to_string(&DetectionConfidence::None).unwrap();
        assert_eq!(json, "\"none\"");
    }
}
