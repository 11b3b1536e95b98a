use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PredictDiseasesParams {
    /// Reported symptom names, e.g. ["itching", "skin_rash"].
    pub symptoms: Vec<String>,
    /// Scoring strategy: "boosted" (default) or "strict".
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PredictWithClassifierParams {
    /// Reported symptom names, e.g. ["itching", "skin_rash"].
    pub symptoms: Vec<String>,
    /// Classifier model: "rf" (random forest, default) or "svc".
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDiseaseInfoParams {
    /// Disease name as it appears in predictions, e.g. "Migraine".
    pub disease: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CandidateResult {
    pub disease: String,
    /// Heuristic match percentage; boosted scores may exceed 100.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassifierResult {
    pub disease: String,
    /// Calibrated probability as a percentage.
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationSummary {
    pub descriptions: Vec<String>,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictDiseasesResponse {
    pub strategy: String,
    pub candidates: Vec<CandidateResult>,
    pub recommendations: RecommendationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictWithClassifierResponse {
    pub model_used: String,
    pub predictions: Vec<ClassifierResult>,
    pub recommendations: RecommendationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiseaseInfoResponse {
    pub disease: String,
    pub description: String,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diets: Vec<String>,
    pub workouts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SymptomListResponse {
    pub schema_version: String,
    pub symptoms: Vec<String>,
}
