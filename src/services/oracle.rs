// Scoring Oracle Client
// HTTP adapter for the deployed clone-detection and AI-likelihood models.
// The aggregator only sees the `PairScorer` seam; this client is the
// production implementation of it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::services::config_store::AppConfig;
use crate::services::triage::risk::DEFAULT_CLONE_THRESHOLD;

const ORACLE_DEFAULT_URL: &str = "https://shafwansafi06-code-clone-detector.hf.space";
const ORACLE_TIMEOUT_SECS: u64 = 30;
const HEALTH_TIMEOUT_SECS: u64 = 5;
const PREDICT_MAX_ATTEMPTS: usize = 2;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("scoring cancelled")]
    Cancelled,
}

pub type ScoreFuture<'a> = Pin<Box<dyn Future<Output = Result<f64, OracleError>> + Send + 'a>>;

/// Pairwise scoring seam used by the batch aggregator. The production
/// implementation is `OracleClient`; tests and embedders may substitute any
/// in-process scorer.
pub trait PairScorer: Send + Sync {
    fn score<'a>(&'a self, code_a: &'a str, code_b: &'a str) -> ScoreFuture<'a>;
}

#[derive(Debug, Clone, Serialize)]
struct PredictRequest<'a> {
    code1: &'a str,
    code2: &'a str,
    threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
struct DetectAiRequest<'a> {
    code: &'a str,
}

/// Response of the pairwise clone endpoint. `clone_probability` is the
/// [0, 1] signal the pipeline consumes; `similarity_score` is the same
/// value on the service's 0-100 display scale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OraclePrediction {
    pub is_clone: bool,
    pub clone_probability: f64,
    pub similarity_score: f64,
    pub confidence: f64,
}

/// Response of the per-sample AI-likelihood endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiPrediction {
    pub ai_score: f64,
    pub human_score: f64,
    pub confidence: f64,
}

pub struct OracleClient {
    client: Client,
    base_url: String,
}

impl Default for OracleClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleClient {
    pub fn new() -> Self {
        let base_url =
            env::var("CODETRIAGE_ORACLE_URL").unwrap_or_else(|_| ORACLE_DEFAULT_URL.to_string());
        Self::with_base_url(&base_url, ORACLE_TIMEOUT_SECS)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from the persisted configuration, falling back to the
    /// environment/default URL for unset fields.
    pub fn from_config(config: &AppConfig) -> Self {
        let base_url = config
            .oracle
            .base_url
            .clone()
            .or_else(|| env::var("CODETRIAGE_ORACLE_URL").ok())
            .unwrap_or_else(|| ORACLE_DEFAULT_URL.to_string());
        let timeout_secs = config.oracle.timeout_secs.unwrap_or(ORACLE_TIMEOUT_SECS);
        Self::with_base_url(&base_url, timeout_secs)
    }

    /// Predict whether two code snippets are clones.
    pub async fn predict(
        &self,
        code1: &str,
        code2: &str,
        threshold: f64,
    ) -> Result<OraclePrediction, OracleError> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest {
                code1,
                code2,
                threshold,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| OracleError::JsonError(e.to_string()))
    }

    /// Per-sample AI-likelihood score.
    pub async fn detect_ai(&self, code: &str) -> Result<AiPrediction, OracleError> {
        let response = self
            .client
            .post(format!("{}/detect-ai", self.base_url))
            .json(&DetectAiRequest { code })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| OracleError::JsonError(e.to_string()))
    }

    /// Liveness probe with a short per-request timeout.
    pub async fn health_check(&self) -> Result<serde_json::Value, OracleError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| OracleError::JsonError(e.to_string()))
    }

    /// `predict` with one retry for transient failures. The scoring model
    /// sleeps on cold starts, so a single second attempt recovers most
    /// batch-time errors.
    async fn predict_with_retry(
        &self,
        code1: &str,
        code2: &str,
    ) -> Result<OraclePrediction, OracleError> {
        let mut last_err: Option<OracleError> = None;

        for attempt in 1..=PREDICT_MAX_ATTEMPTS {
            match self.predict(code1, code2, DEFAULT_CLONE_THRESHOLD).await {
                Ok(prediction) => {
                    if attempt > 1 {
                        info!("[ORACLE] predict recovered on attempt {}", attempt);
                    }
                    return Ok(prediction);
                }
                Err(e) => {
                    warn!("[ORACLE] predict attempt {} failed: {}", attempt, e);
                    last_err = Some(e);
                }
            }

            if attempt < PREDICT_MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(400 * attempt as u64)).await;
            }
        }

        Err(last_err.unwrap_or(OracleError::Cancelled))
    }
}

impl PairScorer for OracleClient {
    fn score<'a>(&'a self, code_a: &'a str, code_b: &'a str) -> ScoreFuture<'a> {
        Box::pin(async move {
            let prediction = self.predict_with_retry(code_a, code_b).await?;
            Ok(prediction.clone_probability.clamp(0.0, 1.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_deserializes_with_missing_fields() {
        let prediction: OraclePrediction =
            serde_json::from_str(r#"{"clone_probability": 0.83}"#).unwrap();
        assert!((prediction.clone_probability - 0.83).abs() < 1e-9);
        assert!(!prediction.is_clone);
        assert_eq!(prediction.similarity_score, 0.0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OracleClient::with_base_url("http://localhost:7860/", 5);
        assert_eq!(client.base_url, "http://localhost:7860");
    }

    #[test]
    fn test_predict_request_payload_shape() {
        let payload = serde_json::to_value(PredictRequest {
            code1: "a",
            code2: "b",
            threshold: 0.6,
        })
        .unwrap();
        assert_eq!(payload["code1"], "a");
        assert_eq!(payload["code2"], "b");
        assert_eq!(payload["threshold"], 0.6);
    }
}
