//! HTTP client for the external symptom classifier.
//!
//! `POST {CLASSIFIER_URL}/predict_proba` with the presence vector; the
//! endpoint answers with index-aligned `labels` and `probabilities`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use symptom_engine::EngineError;
use symptom_engine::classifier::{LabelDistribution, SymptomClassifier};
use symptom_engine::vocabulary::{PresenceVector, VOCABULARY_VERSION};

pub const DEFAULT_MODEL: &str = "rf";
pub const SUPPORTED_MODELS: [&str; 2] = ["rf", "svc"];

#[derive(Clone, Debug)]
pub struct ClassifierClientConfig {
    pub base_url: String,
    pub schema_version: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl ClassifierClientConfig {
    /// `None` when `CLASSIFIER_URL` is unset; the classifier tool is then disabled.
    ///
    /// Optional tuning: `CLASSIFIER_SCHEMA_VERSION`, `CLASSIFIER_TIMEOUT_SECS`,
    /// `CLASSIFIER_MAX_RETRIES`, `CLASSIFIER_RETRY_INITIAL_MS`, `CLASSIFIER_RETRY_MAX_MS`.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CLASSIFIER_URL").ok()?;
        let env_u64 = |name: &str| std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok());

        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            schema_version: std::env::var("CLASSIFIER_SCHEMA_VERSION")
                .unwrap_or_else(|_| VOCABULARY_VERSION.to_string()),
            timeout: Duration::from_secs(env_u64("CLASSIFIER_TIMEOUT_SECS").unwrap_or(10)),
            max_retries: env_u64("CLASSIFIER_MAX_RETRIES")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(2),
            initial_backoff: Duration::from_millis(
                env_u64("CLASSIFIER_RETRY_INITIAL_MS").unwrap_or(200),
            ),
            max_backoff: Duration::from_millis(env_u64("CLASSIFIER_RETRY_MAX_MS").unwrap_or(2_000)),
            max_error_body_bytes: 4 * 1024,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("classifier returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("classifier returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictProbaRequest<'a> {
    pub model: &'a str,
    pub schema_version: &'a str,
    pub features: &'a [f32],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictProbaResponse {
    pub labels: Vec<String>,
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Classifier bound to one model name. Cloning shares the HTTP connection pool.
#[derive(Clone)]
pub struct HttpClassifier {
    config: ClassifierClientConfig,
    http: reqwest::Client,
    model: String,
}

impl HttpClassifier {
    pub fn new(config: ClassifierClientConfig) -> Result<Self, ClassifierClientError> {
        let http = reqwest::Client::builder()
            .user_agent("symptom-match/symptom-server")
            .build()?;
        Ok(Self {
            config,
            http,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn for_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    pub async fn predict_proba(
        &self,
        features: &[f32],
    ) -> Result<PredictProbaResponse, ClassifierClientError> {
        let url = format!("{}/predict_proba", self.config.base_url);
        let body = PredictProbaRequest {
            model: &self.model,
            schema_version: &self.config.schema_version,
            features,
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = self.send_once(&url, &body).await;
            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt <= self.config.max_retries && is_retryable(&e) => {
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        model = %self.model,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "classifier request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(
        &self,
        url: &str,
        body: &PredictProbaRequest<'_>,
    ) -> Result<PredictProbaResponse, ClassifierClientError> {
        let resp = self
            .http
            .post(url)
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<PredictProbaResponse>().await?);
        }

        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(ClassifierClientError::Upstream {
                status,
                message: envelope.error,
            }),
            Err(_) => Err(ClassifierClientError::UpstreamBody { status, body }),
        }
    }
}

impl SymptomClassifier for HttpClassifier {
    fn schema_version(&self) -> &str {
        &self.config.schema_version
    }

    async fn predict_probabilities(
        &self,
        vector: &PresenceVector,
    ) -> Result<LabelDistribution, EngineError> {
        let response = self
            .predict_proba(&vector.values)
            .await
            .map_err(|e| EngineError::Classifier(e.to_string()))?;
        LabelDistribution::new(response.labels, response.probabilities)
    }
}

/// Human-readable name for a supported model id.
pub fn model_display_name(model: &str) -> &str {
    match model {
        "rf" => "Random Forest",
        "svc" => "SVC",
        other => other,
    }
}

fn is_retryable(err: &ClassifierClientError) -> bool {
    match err {
        ClassifierClientError::Request(e) => e.is_timeout() || e.is_connect(),
        ClassifierClientError::Upstream { status, .. }
        | ClassifierClientError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
    }
}

/// Exponential backoff capped at `max`, plus up to 25% jitter.
fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let factor = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let capped_ms = initial
        .as_millis()
        .saturating_mul(factor)
        .min(max.as_millis()) as u64;
    let jitter_ms = clock_jitter_ms((capped_ms / 4).max(1));
    Duration::from_millis(capped_ms.saturating_add(jitter_ms))
}

fn clock_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(bytes) => {
            let end = bytes.len().min(max_bytes);
            String::from_utf8_lossy(&bytes[..end]).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read classifier error body");
            "<unreadable body>".to_string()
        }
    }
}
