// Risk Classification
// Converts continuous similarity/AI/clone scores into discrete, consistently
// ordered risk tiers. All threshold checks live in these tables; call sites
// must not re-encode cut-points inline.

use crate::models::{AiAssessment, CloneAssessment, RiskAssessment};
use super::TriageError;

/// Default threshold for the "is this a clone" verdict on single
/// comparisons. Always caller-overridable; batch call sites in the product
/// have historically used anything from 0.5 to 0.7.
pub const DEFAULT_CLONE_THRESHOLD: f64 = 0.6;

/// Default threshold for the per-sample `is_ai` verdict.
pub const DEFAULT_AI_THRESHOLD: f64 = 0.5;

/// One `(lower_bound, label, description)` tier of a threshold table.
#[derive(Debug, Clone, Copy)]
pub struct RiskTier {
    pub lower_bound: f64,
    pub label: &'static str,
    pub description: &'static str,
}

/// An ordered list of tiers, strictly descending by `lower_bound`, with the
/// lowest bound at 0.0 so the table partitions [0, 1] with no gaps. A score
/// equal to a bound selects that tier, not the one below it.
#[derive(Debug, Clone, Copy)]
pub struct ScoreThresholdTable {
    pub name: &'static str,
    pub tiers: &'static [RiskTier],
}

/// AI-authorship likelihood tiers.
pub const AI_LIKELIHOOD_TABLE: ScoreThresholdTable = ScoreThresholdTable {
    name: "ai_likelihood",
    tiers: &[
        RiskTier {
            lower_bound: 0.8,
            label: "critical",
            description: "Very high likelihood of AI-generated code",
        },
        RiskTier {
            lower_bound: 0.6,
            label: "high",
            description: "High likelihood of AI-generated code",
        },
        RiskTier {
            lower_bound: 0.4,
            label: "medium",
            description: "Moderate likelihood of AI-generated code",
        },
        RiskTier {
            lower_bound: 0.0,
            label: "low",
            description: "Likely human-written code",
        },
    ],
};

/// Pairwise similarity tiers. Some call sites carry a 0-100 percentage;
/// normalize with `normalize_percentage` before lookup.
pub const SIMILARITY_TABLE: ScoreThresholdTable = ScoreThresholdTable {
    name: "similarity_risk",
    tiers: &[
        RiskTier {
            lower_bound: 0.85,
            label: "high",
            description: "Very high similarity - likely plagiarized",
        },
        RiskTier {
            lower_bound: 0.60,
            label: "medium",
            description: "Moderate similarity - requires review",
        },
        RiskTier {
            lower_bound: 0.0,
            label: "low",
            description: "Low similarity - likely independent work",
        },
    ],
};

/// Clone-detection tiers. The `is_clone` verdict is computed separately
/// against a caller-supplied threshold and is independent of the tier.
pub const CLONE_TABLE: ScoreThresholdTable = ScoreThresholdTable {
    name: "clone_risk",
    tiers: &[
        RiskTier {
            lower_bound: 0.8,
            label: "high",
            description: "Very high similarity - likely plagiarized",
        },
        RiskTier {
            lower_bound: 0.6,
            label: "medium",
            description: "Moderate similarity - possible code clone",
        },
        RiskTier {
            lower_bound: 0.3,
            label: "low",
            description: "Low similarity - some common patterns",
        },
        RiskTier {
            lower_bound: 0.0,
            label: "none",
            description: "Minimal similarity - likely original code",
        },
    ],
};

impl ScoreThresholdTable {
    /// Classify a score in [0, 1]. Out-of-range or non-finite scores are a
    /// caller contract violation and fail fast with `InvalidScore`.
    pub fn classify(&self, score: f64) -> Result<RiskAssessment, TriageError> {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(TriageError::InvalidScore(score));
        }

        // Scan descending; the partition invariant guarantees a hit for any
        // in-range score, so the None arm is unreachable for the canonical
        // tables.
        match self.tiers.iter().find(|tier| score >= tier.lower_bound) {
            Some(tier) => Ok(RiskAssessment {
                label: tier.label.to_string(),
                description: tier.description.to_string(),
            }),
            None => Err(TriageError::InvalidScore(score)),
        }
    }

    /// Label of the table's top tier (used for high-risk counting).
    pub fn top_label(&self) -> &'static str {
        self.tiers.first().map(|t| t.label).unwrap_or_default()
    }

    /// Partition invariant: bounds strictly decreasing, lowest bound 0.0.
    pub fn is_partition(&self) -> bool {
        if self.tiers.is_empty() {
            return false;
        }
        let descending = self
            .tiers
            .windows(2)
            .all(|pair| pair[0].lower_bound > pair[1].lower_bound);
        descending && self.tiers[self.tiers.len() - 1].lower_bound == 0.0
    }
}

/// Classify `score` against `table`. Thin free-function form of
/// `ScoreThresholdTable::classify` for call sites that take the table as a
/// parameter.
pub fn classify(score: f64, table: &ScoreThresholdTable) -> Result<RiskAssessment, TriageError> {
    table.classify(score)
}

/// Map a raw similarity value onto [0, 1]. Values above 1.0 are treated as
/// a 0-100 percentage (several UI panels store percentages) and divided
/// down; the result is clamped so boundary noise cannot escape the range.
pub fn normalize_percentage(score: f64) -> f64 {
    let normalized = if score > 1.0 { score / 100.0 } else { score };
    normalized.clamp(0.0, 1.0)
}

pub fn classify_ai_likelihood(score: f64) -> Result<RiskAssessment, TriageError> {
    AI_LIKELIHOOD_TABLE.classify(score)
}

/// Similarity classification. Accepts either a [0, 1] score or a 0-100
/// percentage; NaN still fails the contract check.
pub fn classify_similarity(score: f64) -> Result<RiskAssessment, TriageError> {
    if !score.is_finite() {
        return Err(TriageError::InvalidScore(score));
    }
    SIMILARITY_TABLE.classify(normalize_percentage(score))
}

/// Full clone assessment: tier label from the clone table plus the
/// decoupled `is_clone` verdict against `threshold`.
pub fn assess_clone(score: f64, threshold: f64) -> Result<CloneAssessment, TriageError> {
    let assessment = CLONE_TABLE.classify(score)?;
    Ok(CloneAssessment {
        is_clone: score >= threshold,
        clone_probability: score,
        risk_level: assessment.label,
        risk_description: assessment.description,
        threshold,
    })
}

/// Per-sample AI-authorship assessment from an AI-likelihood oracle score.
pub fn assess_ai_likelihood(score: f64) -> Result<AiAssessment, TriageError> {
    let assessment = AI_LIKELIHOOD_TABLE.classify(score)?;
    Ok(AiAssessment {
        is_ai: score >= DEFAULT_AI_THRESHOLD,
        ai_score: score,
        human_score: 1.0 - score,
        risk_level: assessment.label,
        risk_description: assessment.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_tables_are_partitions() {
        assert!(AI_LIKELIHOOD_TABLE.is_partition());
        assert!(SIMILARITY_TABLE.is_partition());
        assert!(CLONE_TABLE.is_partition());
    }

    #[test]
    fn test_ai_table_boundaries() {
        assert_eq!(classify_ai_likelihood(0.8).unwrap().label, "critical");
        assert_eq!(classify_ai_likelihood(0.79999).unwrap().label, "high");
        assert_eq!(classify_ai_likelihood(0.6).unwrap().label, "high");
        assert_eq!(classify_ai_likelihood(0.4).unwrap().label, "medium");
        assert_eq!(classify_ai_likelihood(0.0).unwrap().label, "low");
        assert_eq!(classify_ai_likelihood(1.0).unwrap().label, "critical");
    }

    #[test]
    fn test_classify_is_total_over_unit_interval() {
        for table in [&AI_LIKELIHOOD_TABLE, &SIMILARITY_TABLE, &CLONE_TABLE] {
            for step in 0..=1000 {
                let score = step as f64 / 1000.0;
                assert!(
                    table.classify(score).is_ok(),
                    "table {} rejected {}",
                    table.name,
                    score
                );
            }
        }
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        assert!(matches!(
            AI_LIKELIHOOD_TABLE.classify(1.2),
            Err(TriageError::InvalidScore(_))
        ));
        assert!(matches!(
            AI_LIKELIHOOD_TABLE.classify(-0.1),
            Err(TriageError::InvalidScore(_))
        ));
        assert!(matches!(
            AI_LIKELIHOOD_TABLE.classify(f64::NAN),
            Err(TriageError::InvalidScore(_))
        ));
    }

    #[test]
    fn test_similarity_accepts_percentage_scale() {
        assert_eq!(classify_similarity(85.0).unwrap().label, "high");
        assert_eq!(classify_similarity(0.85).unwrap().label, "high");
        assert_eq!(classify_similarity(62.0).unwrap().label, "medium");
        assert_eq!(classify_similarity(0.1).unwrap().label, "low");
    }

    #[test]
    fn test_clone_verdict_decoupled_from_label() {
        // Medium tier, but not a clone under a stricter caller threshold.
        let assessment = assess_clone(0.65, 0.7).unwrap();
        assert_eq!(assessment.risk_level, "medium");
        assert!(!assessment.is_clone);

        // Same score, default threshold: still medium, now a clone.
        let assessment = assess_clone(0.65, DEFAULT_CLONE_THRESHOLD).unwrap();
        assert_eq!(assessment.risk_level, "medium");
        assert!(assessment.is_clone);
    }

    #[test]
    fn test_clone_table_top_label() {
        assert_eq!(CLONE_TABLE.top_label(), "high");
        assert_eq!(CLONE_TABLE.classify(0.25).unwrap().label, "none");
        assert_eq!(CLONE_TABLE.classify(0.3).unwrap().label, "low");
    }

    #[test]
    fn test_ai_assessment_shape() {
        let assessment = assess_ai_likelihood(0.9).unwrap();
        assert!(assessment.is_ai);
        assert_eq!(assessment.risk_level, "critical");
        assert!((assessment.human_score - 0.1).abs() < 1e-9);
    }
}
