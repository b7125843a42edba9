// Batch Comparison Aggregation
// Scores every unordered sample pair through the clone oracle and reduces
// the labeled pairs into a single summary. One failed oracle call never
// discards the rest of the batch.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{BatchSummary, CodeSample, ComparisonPair, PairFailure};
use crate::services::oracle::{OracleError, PairScorer};
use super::risk::CLONE_TABLE;
use super::TriageError;

/// In-flight oracle call bound. Protects the remote scoring service; the
/// reduction is order-independent, so correctness does not depend on it.
pub const ORACLE_MAX_CONCURRENCY: usize = 8;

/// Compare all `samples` pairwise and reduce to a `BatchSummary`.
///
/// Exactly N*(N-1)/2 oracle calls are issued, one per unordered pair
/// (i < j). Pairs run concurrently up to `ORACLE_MAX_CONCURRENCY`; the
/// summary is built only after every call has settled and is identical for
/// any evaluation order. A pair is flagged when its score reaches
/// `threshold`; failed pairs are excluded from the aggregates and reported.
pub async fn aggregate_batch<S>(
    samples: &[CodeSample],
    threshold: f64,
    scorer: Arc<S>,
) -> Result<BatchSummary, TriageError>
where
    S: PairScorer + 'static,
{
    if samples.len() < 2 {
        return Err(TriageError::InsufficientInput(samples.len()));
    }

    let started = Instant::now();
    let n = samples.len();
    let total_comparisons = n * (n - 1) / 2;
    let batch_id = Uuid::new_v4();
    info!(
        "[AGGREGATOR] batch {} comparing {} samples across {} pairs (threshold={})",
        batch_id, n, total_comparisons, threshold
    );

    let semaphore = Arc::new(Semaphore::new(ORACLE_MAX_CONCURRENCY));
    let mut join_set: JoinSet<(usize, usize, Result<f64, OracleError>)> = JoinSet::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let scorer = scorer.clone();
            let semaphore = semaphore.clone();
            let code_a = samples[i].text.clone();
            let code_b = samples[j].text.clone();

            join_set.spawn(async move {
                // Permit is held only for the oracle call itself.
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => scorer.score(&code_a, &code_b).await,
                    Err(_) => Err(OracleError::Cancelled),
                };
                (i, j, outcome)
            });
        }
    }

    let mut scored: Vec<ComparisonPair> = Vec::with_capacity(total_comparisons);
    let mut failures: Vec<PairFailure> = Vec::new();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((i, j, Ok(raw_score))) => {
                // The oracle contract is [0, 1]; clamp boundary noise so the
                // classifier's range check cannot trip on a good pair.
                let score = raw_score.clamp(0.0, 1.0);
                match CLONE_TABLE.classify(score) {
                    Ok(assessment) => scored.push(ComparisonPair {
                        index_a: i,
                        index_b: j,
                        score,
                        risk_level: assessment.label,
                        risk_description: assessment.description,
                        is_clone: score >= threshold,
                    }),
                    Err(e) => failures.push(PairFailure {
                        index_a: i,
                        index_b: j,
                        error: e.to_string(),
                    }),
                }
            }
            Ok((i, j, Err(e))) => {
                warn!("[AGGREGATOR] pair ({}, {}) failed: {}", i, j, e);
                failures.push(PairFailure {
                    index_a: i,
                    index_b: j,
                    error: e.to_string(),
                });
            }
            Err(e) => {
                // Task panic or runtime cancellation; counted via the
                // scored/total difference below.
                warn!("[AGGREGATOR] pair task aborted: {}", e);
            }
        }
    }

    // Reproducible display order regardless of completion order.
    scored.sort_by_key(|pair| (pair.index_a, pair.index_b));
    failures.sort_by_key(|failure| (failure.index_a, failure.index_b));

    let scored_comparisons = scored.len();
    let failed_comparisons = total_comparisons - scored_comparisons;

    let mut max_score: Option<f64> = None;
    let mut score_sum = 0.0;
    let mut high_risk_count = 0;
    let top_label = CLONE_TABLE.top_label();
    for pair in &scored {
        score_sum += pair.score;
        max_score = Some(max_score.map_or(pair.score, |current| current.max(pair.score)));
        if pair.risk_level == top_label {
            high_risk_count += 1;
        }
    }
    let average_score = if scored_comparisons > 0 {
        Some(score_sum / scored_comparisons as f64)
    } else {
        None
    };

    let flagged_pairs: Vec<ComparisonPair> = scored
        .into_iter()
        .filter(|pair| pair.score >= threshold)
        .collect();

    info!(
        "[AGGREGATOR] batch {} done: {}/{} scored, {} flagged, {} failed (elapsed_ms={})",
        batch_id,
        scored_comparisons,
        total_comparisons,
        flagged_pairs.len(),
        failed_comparisons,
        started.elapsed().as_millis()
    );

    Ok(BatchSummary {
        batch_id,
        total_samples: n,
        total_comparisons,
        threshold_used: threshold,
        flagged_pairs,
        max_score,
        average_score,
        high_risk_count,
        scored_comparisons,
        failed_comparisons,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::services::oracle::ScoreFuture;

    /// Scores pairs from a fixed table keyed by sample text; records every
    /// pair it is asked about.
    struct MockScorer {
        scores: HashMap<(String, String), Result<f64, String>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockScorer {
        fn new(entries: Vec<((&str, &str), Result<f64, String>)>) -> Self {
            let scores = entries
                .into_iter()
                .map(|((a, b), outcome)| ((a.to_string(), b.to_string()), outcome))
                .collect();
            Self {
                scores,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PairScorer for MockScorer {
        fn score<'a>(&'a self, code_a: &'a str, code_b: &'a str) -> ScoreFuture<'a> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((code_a.to_string(), code_b.to_string()));
                match self.scores.get(&(code_a.to_string(), code_b.to_string())) {
                    Some(Ok(score)) => Ok(*score),
                    Some(Err(message)) => Err(OracleError::ApiError {
                        status: 500,
                        message: message.clone(),
                    }),
                    None => Ok(0.0),
                }
            })
        }
    }

    fn samples(texts: &[&str]) -> Vec<CodeSample> {
        texts.iter().map(|t| CodeSample::new(*t)).collect()
    }

    #[tokio::test]
    async fn test_three_sample_scenario() {
        let scorer = Arc::new(MockScorer::new(vec![
            (("s0", "s1"), Ok(0.92)),
            (("s0", "s2"), Ok(0.3)),
            (("s1", "s2"), Ok(0.71)),
        ]));
        let summary = aggregate_batch(&samples(&["s0", "s1", "s2"]), 0.7, scorer)
            .await
            .unwrap();

        assert_eq!(summary.total_samples, 3);
        assert_eq!(summary.total_comparisons, 3);
        assert_eq!(summary.scored_comparisons, 3);
        assert_eq!(summary.failed_comparisons, 0);

        let flagged: Vec<(usize, usize, f64)> = summary
            .flagged_pairs
            .iter()
            .map(|p| (p.index_a, p.index_b, p.score))
            .collect();
        assert_eq!(flagged, vec![(0, 1, 0.92), (1, 2, 0.71)]);

        assert_eq!(summary.max_score, Some(0.92));
        let average = summary.average_score.unwrap();
        assert!((average - (0.92 + 0.3 + 0.71) / 3.0).abs() < 1e-9);

        // Only the 0.92 pair clears the clone table's 0.8 "high" bound.
        assert_eq!(summary.high_risk_count, 1);
    }

    #[tokio::test]
    async fn test_every_unordered_pair_scored_exactly_once() {
        let scorer = Arc::new(MockScorer::new(vec![]));
        let texts = ["a", "b", "c", "d", "e"];
        let summary = aggregate_batch(&samples(&texts), 0.6, scorer.clone())
            .await
            .unwrap();

        assert_eq!(summary.total_comparisons, 10);
        assert_eq!(summary.scored_comparisons, 10);

        let mut calls = scorer.calls.lock().unwrap().clone();
        calls.sort();
        calls.dedup();
        assert_eq!(calls.len(), 10, "a pair was repeated or skipped");
        for (a, b) in &calls {
            let i = texts.iter().position(|t| t == a).unwrap();
            let j = texts.iter().position(|t| t == b).unwrap();
            assert!(i < j, "pair ({}, {}) not in (i < j) order", i, j);
        }
    }

    #[tokio::test]
    async fn test_partial_failure_excluded_from_aggregates() {
        let scorer = Arc::new(MockScorer::new(vec![
            (("s0", "s1"), Ok(0.9)),
            (("s0", "s2"), Err("model unavailable".to_string())),
            (("s1", "s2"), Ok(0.5)),
        ]));
        let summary = aggregate_batch(&samples(&["s0", "s1", "s2"]), 0.6, scorer)
            .await
            .unwrap();

        assert_eq!(summary.scored_comparisons, 2);
        assert_eq!(summary.failed_comparisons, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(
            (summary.failures[0].index_a, summary.failures[0].index_b),
            (0, 2)
        );

        assert_eq!(summary.max_score, Some(0.9));
        let average = summary.average_score.unwrap();
        assert!((average - 0.7).abs() < 1e-9);
        assert_eq!(summary.high_risk_count, 1);
    }

    #[tokio::test]
    async fn test_all_pairs_failed() {
        let scorer = Arc::new(MockScorer::new(vec![
            (("s0", "s1"), Err("down".to_string())),
        ]));
        let summary = aggregate_batch(&samples(&["s0", "s1"]), 0.6, scorer)
            .await
            .unwrap();

        assert_eq!(summary.scored_comparisons, 0);
        assert_eq!(summary.failed_comparisons, 1);
        assert_eq!(summary.max_score, None);
        assert_eq!(summary.average_score, None);
        assert!(summary.flagged_pairs.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_input() {
        let scorer = Arc::new(MockScorer::new(vec![]));
        let result = aggregate_batch(&samples(&["only one"]), 0.6, scorer).await;
        assert!(matches!(result, Err(TriageError::InsufficientInput(1))));
    }

    #[tokio::test]
    async fn test_flagged_pairs_sorted_ascending() {
        let scorer = Arc::new(MockScorer::new(vec![
            (("s0", "s1"), Ok(0.65)),
            (("s0", "s2"), Ok(0.99)),
            (("s0", "s3"), Ok(0.7)),
            (("s1", "s2"), Ok(0.8)),
            (("s1", "s3"), Ok(0.61)),
            (("s2", "s3"), Ok(0.95)),
        ]));
        let summary = aggregate_batch(&samples(&["s0", "s1", "s2", "s3"]), 0.6, scorer)
            .await
            .unwrap();

        let order: Vec<(usize, usize)> = summary
            .flagged_pairs
            .iter()
            .map(|p| (p.index_a, p.index_b))
            .collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(order.len(), 6);
    }

    #[tokio::test]
    async fn test_threshold_boundary_flags_equal_score() {
        let scorer = Arc::new(MockScorer::new(vec![(("s0", "s1"), Ok(0.7))]));
        let summary = aggregate_batch(&samples(&["s0", "s1"]), 0.7, scorer)
            .await
            .unwrap();
        assert_eq!(summary.flagged_pairs.len(), 1);
        assert!(summary.flagged_pairs[0].is_clone);
    }
}
