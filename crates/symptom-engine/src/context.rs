use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{AggregatedResponse, MergePolicy, RankedDisease, aggregate};
use crate::classifier::{ClassifierPrediction, SymptomClassifier, classify};
use crate::corpus::DiseaseCorpus;
use crate::error::EngineError;
use crate::reference::{RecommendationLookup, ReferenceTables};
use crate::rules::ScoringRules;
use crate::scorer::{ScoredCandidate, ScoringStrategy, rank};
use crate::symptoms::SymptomSet;
use crate::vocabulary::SymptomVocabulary;

pub const TRAINING_FILE: &str = "Training.csv";
pub const DESCRIPTION_FILE: &str = "description.csv";
pub const PRECAUTIONS_FILE: &str = "precautions_df.csv";
pub const MEDICATIONS_FILE: &str = "medications.csv";
pub const DIETS_FILE: &str = "diets.csv";
pub const WORKOUTS_FILE: &str = "workout_df.csv";

/// Locations of the reference CSV files.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub training: PathBuf,
    pub descriptions: PathBuf,
    pub precautions: PathBuf,
    pub medications: PathBuf,
    pub diets: PathBuf,
    pub workouts: PathBuf,
}

impl DataPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            training: dir.join(TRAINING_FILE),
            descriptions: dir.join(DESCRIPTION_FILE),
            precautions: dir.join(PRECAUTIONS_FILE),
            medications: dir.join(MEDICATIONS_FILE),
            diets: dir.join(DIETS_FILE),
            workouts: dir.join(WORKOUTS_FILE),
        }
    }

    pub fn all(&self) -> [&Path; 6] {
        [
            &self.training,
            &self.descriptions,
            &self.precautions,
            &self.medications,
            &self.diets,
            &self.workouts,
        ]
    }

    /// Files that do not exist on disk.
    pub fn missing(&self) -> Vec<&Path> {
        self.all().into_iter().filter(|p| !p.exists()).collect()
    }
}

/// Ranked candidates plus their merged recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub strategy: ScoringStrategy,
    pub candidates: Vec<ScoredCandidate>,
    pub recommendations: AggregatedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPrediction {
    pub predictions: Vec<ClassifierPrediction>,
    pub recommendations: AggregatedResponse,
}

/// Everything known about a single disease, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub disease: String,
    pub description: String,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

/// Read-only reference data and scoring rules, built once and shared by
/// every query.
#[derive(Debug, Clone)]
pub struct EngineContext {
    vocabulary: SymptomVocabulary,
    corpus: DiseaseCorpus,
    tables: ReferenceTables,
    rules: ScoringRules,
}

impl EngineContext {
    pub fn new(
        vocabulary: SymptomVocabulary,
        corpus: DiseaseCorpus,
        tables: ReferenceTables,
        rules: ScoringRules,
    ) -> Self {
        Self {
            vocabulary,
            corpus,
            tables,
            rules,
        }
    }

    pub fn load(paths: &DataPaths, rules: ScoringRules) -> Result<Self, EngineError> {
        let vocabulary = SymptomVocabulary::builtin();
        let corpus = DiseaseCorpus::load(&paths.training)?;

        let unknown = vocabulary.unknown_columns(corpus.symptom_columns());
        if !unknown.is_empty() {
            warn!(
                vocabulary = vocabulary.version(),
                unknown = ?unknown,
                "corpus has symptom columns outside the vocabulary"
            );
        }

        let tables = ReferenceTables::load(paths)?;
        for disease in corpus.disease_names() {
            if tables.recommendations(disease).is_none() {
                warn!(disease, "no reference data for disease");
            }
        }

        info!(
            vocabulary = vocabulary.version(),
            cases = corpus.len(),
            common_conditions = rules.common_conditions.len(),
            overrides = rules.overrides.rules().len(),
            top_n = rules.top_n,
            "engine context ready"
        );
        Ok(Self::new(vocabulary, corpus, tables, rules))
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    pub fn corpus(&self) -> &DiseaseCorpus {
        &self.corpus
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn rank(&self, query: &SymptomSet, strategy: ScoringStrategy) -> Vec<ScoredCandidate> {
        rank(&self.corpus, &self.rules, query, strategy)
    }

    pub fn recommend<R: RankedDisease>(&self, ranked: &[R], policy: MergePolicy) -> AggregatedResponse {
        aggregate(ranked, &self.tables, policy)
    }

    pub fn predict(
        &self,
        query: &SymptomSet,
        strategy: ScoringStrategy,
        policy: MergePolicy,
    ) -> Prediction {
        let candidates = self.rank(query, strategy);
        let recommendations = self.recommend(&candidates, policy);
        Prediction {
            strategy,
            candidates,
            recommendations,
        }
    }

    pub async fn predict_with_classifier<C: SymptomClassifier>(
        &self,
        classifier: &C,
        query: &SymptomSet,
        k: usize,
        policy: MergePolicy,
    ) -> Result<ClassifiedPrediction, EngineError> {
        let predictions = classify(&self.vocabulary, classifier, query, k).await?;
        let recommendations = self.recommend(&predictions, policy);
        Ok(ClassifiedPrediction {
            predictions,
            recommendations,
        })
    }

    /// Returns `None` when no reference table mentions `disease`.
    pub fn disease_info(&self, disease: &str) -> Option<DiseaseInfo> {
        let bundle = self.tables.recommendations(disease)?;
        Some(DiseaseInfo {
            disease: disease.trim().to_string(),
            description: bundle.description_or_sentinel().to_string(),
            precautions: bundle
                .precautions
                .iter()
                .flatten()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect(),
            medications: non_blank(&bundle.medications),
            diets: non_blank(&bundle.diets),
            workouts: non_blank(&bundle.workouts),
        })
    }
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect()
}
