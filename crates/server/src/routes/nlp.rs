use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use matcher::DuplicateMatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage::{EntityBundle, ScoredLabel, SentimentLabel, SentimentResult};

/// Body of analyze-report and pipeline
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRequest {
    #[serde(default)]
    pub text: String,

    /// Earlier reports to compare against; missing means none
    #[serde(default)]
    pub candidates: Vec<String>,

    /// Inclusive similarity cut-off; server default when absent
    #[serde(default)]
    pub threshold: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub category: String,
    pub confidence: f32,
    pub sentiment: SentimentLabel,
    /// Same value as `urgency_score`
    pub urgency: f32,
    pub urgency_score: f32,
    pub summary: String,
    pub entities: EntityBundle,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub language: String,
    pub translated_text: String,
    /// Empty when no embedding backend was available
    pub embedding: Vec<f32>,
    pub dim: usize,
    pub sentiment: SentimentResult,
    pub urgency_score: f32,
    pub classification: Vec<ScoredLabel>,
    pub entities: EntityBundle,
    pub summary: String,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub ok: bool,
    pub model: String,
    pub dim: usize,
    pub vector: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DuplicateResponse {
    pub is_potential_duplicate: bool,
    pub similar_reports: Vec<DuplicateMatch>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload.map(|Json(inner)| inner).map_err(ServerError::from)
}

/// Category, sentiment, urgency, summary and entities for one report
pub async fn analyze_report(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> ServerResult<Json<AnalyzeResponse>> {
    let request = body(payload)?;
    let result = state
        .pipeline
        .analyze(&request.text, request.language.as_deref())
        .await?;

    Ok(Json(AnalyzeResponse {
        category: result.category,
        confidence: result.confidence,
        sentiment: result.sentiment,
        urgency: result.urgency_score,
        urgency_score: result.urgency_score,
        summary: result.summary,
        entities: result.entities,
    }))
}

/// Full analysis plus embedding; blank text is a 400
pub async fn pipeline(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> ServerResult<Json<PipelineResponse>> {
    let request = body(payload)?;
    let analysis = state
        .pipeline
        .analyze_unified(&request.text, request.language.as_deref())
        .await?;

    let dim = analysis.dim();
    let model = analysis.model().map(str::to_string);
    Ok(Json(PipelineResponse {
        language: analysis.language,
        translated_text: analysis.translated_text,
        embedding: analysis.embedding.map(|e| e.values).unwrap_or_default(),
        dim,
        sentiment: analysis.sentiment,
        urgency_score: analysis.urgency_score,
        classification: analysis.classification,
        entities: analysis.entities,
        summary: analysis.summary,
        model,
    }))
}

/// Embedding only; 503 when no backend can produce one
pub async fn embed(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> ServerResult<Json<EmbedResponse>> {
    let request = body(payload)?;
    let vector = state.pipeline.embed(&request.text).await?;

    Ok(Json(EmbedResponse {
        ok: true,
        model: vector.backend_id,
        dim: vector.dim,
        vector: vector.values,
    }))
}

/// Similar earlier reports; never fails because of embedding backends
pub async fn find_duplicates(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<DuplicateRequest>, JsonRejection>,
) -> ServerResult<Json<DuplicateResponse>> {
    let request = body(payload)?;
    if request.candidates.is_empty() {
        return Ok(Json(DuplicateResponse {
            is_potential_duplicate: false,
            similar_reports: Vec::new(),
        }));
    }
    let threshold = request.threshold.unwrap_or(state.duplicate_threshold);
    if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
        return Err(ServerError::BadRequest(format!(
            "threshold must be within [-1, 1], got {threshold}"
        )));
    }

    let result = state
        .detector
        .find(&request.text, &request.candidates, threshold)
        .await
        .into_value();

    Ok(Json(DuplicateResponse {
        is_potential_duplicate: result.is_duplicate,
        similar_reports: result.matches,
    }))
}
