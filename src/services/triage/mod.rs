// Triage Module
// Code identification and risk classification pipeline, organized into
// specialized submodules:
// - language: programming-language identification from filename/content
// - risk: score threshold tables and risk classification
// - aggregation: batch pairwise comparison and summary reduction

pub mod aggregation;
pub mod language;
pub mod risk;

use thiserror::Error;

/// Library-level contract violations. Oracle failures are a separate
/// taxonomy (`OracleError`) because they are recovered per pair instead of
/// failing the call.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("score {0} is outside [0, 1]")]
    InvalidScore(f64),
    #[error("batch comparison requires at least 2 samples, got {0}")]
    InsufficientInput(usize),
}

// Re-export commonly used functions
pub use aggregation::{aggregate_batch, ORACLE_MAX_CONCURRENCY};
pub use language::{identify, identify_language_from_extension};
pub use risk::{
    assess_ai_likelihood,
    assess_clone,
    classify,
    classify_ai_likelihood,
    classify_similarity,
    normalize_percentage,
    RiskTier,
    ScoreThresholdTable,
    AI_LIKELIHOOD_TABLE,
    CLONE_TABLE,
    DEFAULT_AI_THRESHOLD,
    DEFAULT_CLONE_THRESHOLD,
    SIMILARITY_TABLE,
};
