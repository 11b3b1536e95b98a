/// Redis caching layer for prediction results.
///
/// Key schema:
/// - `sym:v1:predict:{sha256(namespace|strategy|symptoms)}`: JSON `Prediction` (TTL: 3600s)
/// - `sym:v1:classify:{sha256(namespace|model|symptoms)}`: JSON `ClassifiedPrediction` (TTL: 3600s)
///
/// The namespace covers the data directory, scoring rules, classifier URL and
/// schema version. Symptoms are hashed in sorted order, so the cache hit does
/// not depend on how the caller ordered its input.
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use symptom_engine::SymptomSet;
use symptom_engine::context::{ClassifiedPrediction, Prediction};
use symptom_engine::scorer::ScoringStrategy;

use crate::classifier::ClassifierClientConfig;
use crate::redis::RedisCache;

const KEY_PREFIX: &str = "sym:v1:";
const PREDICTION_TTL_SECS: u64 = 3600;

pub struct PredictionCache {
    redis: RedisCache,
    namespace: String,
}

impl PredictionCache {
    pub fn new(redis: RedisCache, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_enabled()
    }

    pub async fn get_prediction(
        &self,
        strategy: ScoringStrategy,
        query: &SymptomSet,
    ) -> Option<Prediction> {
        self.get_json(&self.key("predict", strategy.as_str(), query)).await
    }

    pub async fn set_prediction(&self, query: &SymptomSet, prediction: &Prediction) {
        let key = self.key("predict", prediction.strategy.as_str(), query);
        self.set_json(&key, prediction).await;
    }

    pub async fn get_classified(&self, model: &str, query: &SymptomSet) -> Option<ClassifiedPrediction> {
        self.get_json(&self.key("classify", model, query)).await
    }

    pub async fn set_classified(&self, model: &str, query: &SymptomSet, prediction: &ClassifiedPrediction) {
        let key = self.key("classify", model, query);
        self.set_json(&key, prediction).await;
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.redis.get(key).await?;
        let value = serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()?;
        debug!(key, "cache hit");
        Some(value)
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            self.redis.set_with_ttl(key, &json, PREDICTION_TTL_SECS).await;
        }
    }

    fn key(&self, kind: &str, variant: &str, query: &SymptomSet) -> String {
        prediction_key(&self.namespace, kind, variant, query)
    }
}

/// Cache namespace for one server configuration.
pub fn cache_namespace(data_namespace: &str, classifier: Option<&ClassifierClientConfig>) -> String {
    match classifier {
        Some(c) => format!("{data_namespace}|{}|{}", c.base_url, c.schema_version),
        None => format!("{data_namespace}|no-classifier"),
    }
}

fn prediction_key(namespace: &str, kind: &str, variant: &str, query: &SymptomSet) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"|");
    hasher.update(variant.as_bytes());
    for symptom in query.iter() {
        hasher.update(b"|");
        hasher.update(symptom.as_bytes());
    }
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}{kind}:{:x}", hash)
}
