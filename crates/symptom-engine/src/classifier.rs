//! Classifier-backed prediction.
//!
//! A trained classifier maps a [`PresenceVector`] to a calibrated probability
//! per disease label. Confidences here sum to 100 across all labels, unlike
//! the uncalibrated match scores of [`crate::scorer`], so predictions use their
//! own type.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::scorer::round2;
use crate::symptoms::SymptomSet;
use crate::vocabulary::{PresenceVector, SymptomVocabulary};

/// Number of labels the classifier path reports.
pub const DEFAULT_TOP_K: usize = 3;

/// External model contract.
pub trait SymptomClassifier: Send + Sync {
    /// Vocabulary version the model's feature order was trained against.
    fn schema_version(&self) -> &str;

    fn predict_probabilities(
        &self,
        vector: &PresenceVector,
    ) -> impl Future<Output = Result<LabelDistribution, EngineError>> + Send;
}

/// Probability per label, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDistribution")]
pub struct LabelDistribution {
    labels: Vec<String>,
    probabilities: Vec<f64>,
}

#[derive(Deserialize)]
struct RawDistribution {
    labels: Vec<String>,
    probabilities: Vec<f64>,
}

impl TryFrom<RawDistribution> for LabelDistribution {
    type Error = EngineError;

    fn try_from(raw: RawDistribution) -> Result<Self, Self::Error> {
        Self::new(raw.labels, raw.probabilities)
    }
}

impl LabelDistribution {
    pub fn new(labels: Vec<String>, probabilities: Vec<f64>) -> Result<Self, EngineError> {
        if labels.len() != probabilities.len() {
            return Err(EngineError::Classifier(format!(
                "{} labels but {} probabilities",
                labels.len(),
                probabilities.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(EngineError::Classifier(
                "probability distribution contains non-finite values".to_string(),
            ));
        }
        Ok(Self {
            labels,
            probabilities,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPrediction {
    pub disease: String,
    /// `probability * 100`, rounded to two decimals.
    pub confidence: f64,
}

/// The `k` most probable labels, highest first. Equal probabilities keep
/// label order.
pub fn top_predictions(distribution: &LabelDistribution, k: usize) -> Vec<ClassifierPrediction> {
    let mut order: Vec<usize> = (0..distribution.labels.len()).collect();
    order.sort_by(|&a, &b| {
        distribution.probabilities[b].total_cmp(&distribution.probabilities[a])
    });
    order
        .into_iter()
        .take(k)
        .map(|i| ClassifierPrediction {
            disease: distribution.labels[i].clone(),
            confidence: round2(distribution.probabilities[i] * 100.0),
        })
        .collect()
}

/// Build the presence vector for `query`, run the classifier and keep the
/// top `k` labels.
pub async fn classify<C: SymptomClassifier>(
    vocabulary: &SymptomVocabulary,
    classifier: &C,
    query: &SymptomSet,
    k: usize,
) -> Result<Vec<ClassifierPrediction>, EngineError> {
    if classifier.schema_version() != vocabulary.version() {
        return Err(EngineError::SchemaMismatch {
            expected: classifier.schema_version().to_string(),
            actual: vocabulary.version().to_string(),
        });
    }

    let vector = vocabulary.presence_vector(query);
    let distribution = classifier.predict_probabilities(&vector).await?;
    let predictions = top_predictions(&distribution, k);
    debug!(
        active_features = vector.active_count(),
        labels = distribution.labels().len(),
        predictions = predictions.len(),
        "classifier prediction complete"
    );
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::VOCABULARY_VERSION;

    /// Scores each label by how many of its listed feature indices are set.
    struct FixedClassifier {
        version: &'static str,
        labels: Vec<(&'static str, Vec<usize>)>,
    }

    impl SymptomClassifier for FixedClassifier {
        fn schema_version(&self) -> &str {
            self.version
        }

        async fn predict_probabilities(
            &self,
            vector: &PresenceVector,
        ) -> Result<LabelDistribution, EngineError> {
            let raw: Vec<f64> = self
                .labels
                .iter()
                .map(|(_, idx)| idx.iter().map(|&i| vector.values[i] as f64).sum::<f64>() + 0.1)
                .collect();
            let total: f64 = raw.iter().sum();
            LabelDistribution::new(
                self.labels.iter().map(|(l, _)| l.to_string()).collect(),
                raw.into_iter().map(|r| r / total).collect(),
            )
        }
    }

    fn classifier(version: &'static str) -> FixedClassifier {
        FixedClassifier {
            version,
            labels: vec![
                ("Fungal infection", vec![0, 1, 2]),
                ("Common Cold", vec![24, 25]),
                ("Allergy", vec![3]),
                ("Acne", vec![123]),
            ],
        }
    }

    #[tokio::test]
    async fn classify_returns_top_three_calibrated() {
        let vocab = SymptomVocabulary::builtin();
        let query = SymptomSet::parse("itching, skin_rash, cough");
        let predictions = classify(&vocab, &classifier(VOCABULARY_VERSION), &query, DEFAULT_TOP_K)
            .await
            .expect("classification should succeed");

        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].disease, "Fungal infection");
        assert_eq!(predictions[1].disease, "Common Cold");
        // raw = [2.1, 1.1, 0.1, 0.1] / 3.4
        assert_eq!(predictions[0].confidence, 61.76);
        assert_eq!(predictions[1].confidence, 32.35);
        assert_eq!(predictions[2].disease, "Allergy");
        assert!(predictions.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[tokio::test]
    async fn schema_mismatch_is_rejected() {
        let vocab = SymptomVocabulary::builtin();
        let err = classify(&vocab, &classifier("symptoms-v0"), &SymptomSet::default(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch { .. }));
    }

    #[test]
    fn top_predictions_caps_at_label_count() {
        let dist = LabelDistribution::new(vec!["a".into(), "b".into()], vec![0.25, 0.75])
            .expect("valid distribution");
        let top = top_predictions(&dist, 5);
        assert_eq!(
            top,
            vec![
                ClassifierPrediction { disease: "b".into(), confidence: 75.0 },
                ClassifierPrediction { disease: "a".into(), confidence: 25.0 },
            ]
        );
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(LabelDistribution::new(vec!["a".into()], vec![0.5, 0.5]).is_err());
        assert!(LabelDistribution::new(vec!["a".into()], vec![f64::NAN]).is_err());
    }

    #[test]
    fn deserialization_validates_lengths() {
        let mismatched =
            serde_json::from_str::<LabelDistribution>(r#"{"labels":["a","b"],"probabilities":[0.5]}"#);
        assert!(mismatched.is_err());

        let dist: LabelDistribution =
            serde_json::from_str(r#"{"labels":["a","b"],"probabilities":[0.5,0.5]}"#)
                .expect("valid distribution");
        assert_eq!(top_predictions(&dist, 3).len(), 2);
    }
}
