use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use symptom_engine::aggregate::{AggregatedResponse, MergePolicy};
use symptom_engine::classifier::DEFAULT_TOP_K;
use symptom_engine::context::{ClassifiedPrediction, Prediction};
use symptom_engine::scorer::ScoringStrategy;
use symptom_engine::{EngineContext, SymptomSet};

use crate::api::{
    CandidateResult, ClassifierResult, DiseaseInfoResponse, GetDiseaseInfoParams,
    PredictDiseasesParams, PredictDiseasesResponse, PredictWithClassifierParams,
    PredictWithClassifierResponse, RecommendationSummary, SymptomListResponse,
};
use crate::cache::PredictionCache;
use crate::classifier::{DEFAULT_MODEL, HttpClassifier, SUPPORTED_MODELS, model_display_name};

#[derive(Clone)]
pub struct SymptomServer {
    engine: Arc<EngineContext>,
    classifier: Option<Arc<HttpClassifier>>,
    cache: Arc<PredictionCache>,
    tool_router: ToolRouter<SymptomServer>,
}

impl SymptomServer {
    pub fn new(
        engine: Arc<EngineContext>,
        classifier: Option<Arc<HttpClassifier>>,
        cache: Arc<PredictionCache>,
    ) -> Self {
        Self {
            engine,
            classifier,
            cache,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl SymptomServer {
    #[tool(description = "Rank likely diseases for a list of symptoms and merge their precautions, medications, diets and workouts.")]
    async fn predict_diseases(
        &self,
        Parameters(params): Parameters<PredictDiseasesParams>,
    ) -> Result<Json<PredictDiseasesResponse>, String> {
        let query = parse_query(&params.symptoms)?;
        let strategy = match params.strategy.as_deref() {
            Some(raw) => raw.parse::<ScoringStrategy>()?,
            None => ScoringStrategy::default(),
        };

        if let Some(cached) = self.cache.get_prediction(strategy, &query).await {
            return Ok(Json(to_api_prediction(cached)));
        }

        let prediction = self
            .engine
            .predict(&query, strategy, MergePolicy::SetCollapse);
        info!(
            strategy = %strategy,
            symptoms = query.len(),
            candidates = prediction.candidates.len(),
            "predict_diseases"
        );
        self.cache.set_prediction(&query, &prediction).await;

        Ok(Json(to_api_prediction(prediction)))
    }

    #[tool(description = "Predict the top 3 diseases with the trained classifier ('rf' or 'svc') and merge their recommendations.")]
    async fn predict_with_classifier(
        &self,
        Parameters(params): Parameters<PredictWithClassifierParams>,
    ) -> Result<Json<PredictWithClassifierResponse>, String> {
        let query = parse_query(&params.symptoms)?;
        let model = params
            .model
            .as_deref()
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if !SUPPORTED_MODELS.contains(&model.as_str()) {
            return Err(format!(
                "unknown model: '{model}'. Available models: {}",
                SUPPORTED_MODELS.join(", ")
            ));
        }

        let classifier = self
            .classifier
            .as_ref()
            .ok_or_else(|| "classifier is not configured (set CLASSIFIER_URL)".to_string())?;

        if let Some(cached) = self.cache.get_classified(&model, &query).await {
            return Ok(Json(to_api_classified(&model, cached)));
        }

        let classifier = classifier.for_model(&model);
        let prediction = self
            .engine
            .predict_with_classifier(&classifier, &query, DEFAULT_TOP_K, MergePolicy::SetCollapse)
            .await
            .map_err(|e| format!("classifier prediction failed: {e}"))?;
        info!(
            model = %model,
            symptoms = query.len(),
            predictions = prediction.predictions.len(),
            "predict_with_classifier"
        );
        self.cache.set_classified(&model, &query, &prediction).await;

        Ok(Json(to_api_classified(&model, prediction)))
    }

    #[tool(description = "Get the description, precautions, medications, diets and workouts for one disease.")]
    async fn get_disease_info(
        &self,
        Parameters(params): Parameters<GetDiseaseInfoParams>,
    ) -> Result<Json<DiseaseInfoResponse>, String> {
        let disease = params.disease.trim();
        if disease.is_empty() {
            return Err("disease must not be empty".to_string());
        }

        let info = self
            .engine
            .disease_info(disease)
            .ok_or_else(|| format!("disease not found: {disease}"))?;

        Ok(Json(DiseaseInfoResponse {
            disease: info.disease,
            description: info.description,
            precautions: info.precautions,
            medications: info.medications,
            diets: info.diets,
            workouts: info.workouts,
        }))
    }

    #[tool(description = "List the recognized symptom names in classifier feature order.")]
    async fn list_symptoms(&self) -> Result<Json<SymptomListResponse>, String> {
        let vocabulary = self.engine.vocabulary();
        Ok(Json(SymptomListResponse {
            schema_version: vocabulary.version().to_string(),
            symptoms: vocabulary.names().to_vec(),
        }))
    }
}

fn parse_query(symptoms: &[String]) -> Result<SymptomSet, String> {
    let query: SymptomSet = symptoms.iter().collect();
    if query.is_empty() {
        return Err("no symptoms provided".to_string());
    }
    Ok(query)
}

fn to_summary(recommendations: AggregatedResponse) -> RecommendationSummary {
    RecommendationSummary {
        descriptions: recommendations.descriptions,
        precautions: recommendations.precautions,
        medications: recommendations.medications,
        diets: recommendations.diets,
        workouts: recommendations.workouts,
    }
}

fn to_api_prediction(prediction: Prediction) -> PredictDiseasesResponse {
    PredictDiseasesResponse {
        strategy: prediction.strategy.to_string(),
        candidates: prediction
            .candidates
            .into_iter()
            .map(|c| CandidateResult {
                disease: c.disease,
                score: c.score,
            })
            .collect(),
        recommendations: to_summary(prediction.recommendations),
    }
}

fn to_api_classified(model: &str, prediction: ClassifiedPrediction) -> PredictWithClassifierResponse {
    PredictWithClassifierResponse {
        model_used: model_display_name(model).to_string(),
        predictions: prediction
            .predictions
            .into_iter()
            .map(|p| ClassifierResult {
                disease: p.disease,
                confidence: p.confidence,
            })
            .collect(),
        recommendations: to_summary(prediction.recommendations),
    }
}

#[tool_handler]
impl ServerHandler for SymptomServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "symptom-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Symptom-to-disease matcher. Use predict_diseases for heuristic ranking \
                 (strategy 'boosted' or 'strict'), predict_with_classifier for the trained \
                 model, get_disease_info for one disease, and list_symptoms for the accepted \
                 symptom names. Results are informational and not a medical diagnosis."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symptom_engine::corpus::{DiseaseCorpus, DiseaseProfile};
    use symptom_engine::reference::{ReferenceRows, ReferenceTables};
    use symptom_engine::rules::ScoringRules;
    use symptom_engine::vocabulary::SymptomVocabulary;

    use crate::redis::RedisCache;

    fn server() -> SymptomServer {
        let corpus = DiseaseCorpus::from_profiles(vec![
            DiseaseProfile::new("Fungal infection", ["itching", "skin_rash"]),
            DiseaseProfile::new("Common Cold", ["cough", "high_fever", "headache"]),
        ]);
        let tables = ReferenceTables::from_rows(ReferenceRows::default());
        let engine = EngineContext::new(
            SymptomVocabulary::builtin(),
            corpus,
            tables,
            ScoringRules::default(),
        );
        let cache = PredictionCache::new(RedisCache::new(None), "test");
        SymptomServer::new(Arc::new(engine), None, Arc::new(cache))
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = SymptomServer::tool_router().list_all();
        for name in [
            "predict_diseases",
            "predict_with_classifier",
            "get_disease_info",
            "list_symptoms",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn predict_diseases_rejects_empty_input() {
        let err = server()
            .predict_diseases(Parameters(PredictDiseasesParams {
                symptoms: vec!["  ".to_string(), "[]".to_string()],
                strategy: None,
            }))
            .await
            .err()
            .expect("tool call should fail");
        assert_eq!(err, "no symptoms provided");
    }

    #[tokio::test]
    async fn predict_diseases_ranks_with_requested_strategy() {
        let Json(response) = server()
            .predict_diseases(Parameters(PredictDiseasesParams {
                symptoms: vec!["cough".to_string(), "high_fever".to_string()],
                strategy: Some("strict".to_string()),
            }))
            .await
            .expect("prediction");
        assert_eq!(response.strategy, "strict");
        assert_eq!(response.candidates[0].disease, "Common Cold");
        assert_eq!(response.candidates[0].score, 66.67);
    }

    #[tokio::test]
    async fn classifier_tool_requires_configuration() {
        let server = server();
        let err = server
            .predict_with_classifier(Parameters(PredictWithClassifierParams {
                symptoms: vec!["cough".to_string()],
                model: Some("svc".to_string()),
            }))
            .await
            .err()
            .expect("tool call should fail");
        assert!(err.contains("CLASSIFIER_URL"), "{err}");

        let err = server
            .predict_with_classifier(Parameters(PredictWithClassifierParams {
                symptoms: vec!["cough".to_string()],
                model: Some("xgb".to_string()),
            }))
            .await
            .err()
            .expect("tool call should fail");
        assert!(err.starts_with("unknown model"), "{err}");
    }

    #[tokio::test]
    async fn list_symptoms_reports_vocabulary() {
        let Json(response) = server().list_symptoms().await.expect("symptoms");
        assert_eq!(response.schema_version, "symptoms-v1");
        assert_eq!(response.symptoms.len(), 132);
        assert_eq!(response.symptoms[0], "itching");
    }
}
