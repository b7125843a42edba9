// CodeTriage Core Services
// Migrated from Python backend

pub mod config_store;
pub mod oracle;
pub mod triage;

pub use config_store::*;
pub use oracle::*;

// Re-export triage module functions
pub use triage::{
    aggregate_batch,
    assess_ai_likelihood,
    assess_clone,
    classify,
    classify_ai_likelihood,
    classify_similarity,
    identify,
    identify_language_from_extension,
    normalize_percentage,
    RiskTier,
    ScoreThresholdTable,
    TriageError,
    AI_LIKELIHOOD_TABLE,
    CLONE_TABLE,
    DEFAULT_AI_THRESHOLD,
    DEFAULT_CLONE_THRESHOLD,
    SIMILARITY_TABLE,
};
