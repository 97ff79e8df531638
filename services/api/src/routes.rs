use crate::infra::{
    deserialize_optional_tier, validate_top_k, AppState, TierSelection, DEFAULT_DIAGNOSTIC_TOP_K,
};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use district_match::error::AppError;
use district_match::recommend::{
    DistrictNegativeReport, DistrictView, FactorSpec, NegativeContribution, PriceTier,
    RankedDistrict, RecommendationRequest, RecommendedDistrictView, SurveyAnswers, WeightView,
    DEFAULT_ANSWER, DEFAULT_RECOMMENDATION_LIMIT, MAX_ANSWER, MIN_ANSWER,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecommendationPayload {
    #[serde(default)]
    pub(crate) answers: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "deserialize_optional_tier")]
    pub(crate) tier: Option<TierSelection>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecommendationResponse {
    pub(crate) generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tier: Option<PriceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tier_label: Option<&'static str>,
    pub(crate) weights: Vec<WeightView>,
    pub(crate) zero_weights: bool,
    pub(crate) recommendations: Vec<RecommendedDistrictView>,
    pub(crate) ranking: Vec<RankedDistrict>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerScale {
    pub(crate) min: u8,
    pub(crate) max: u8,
    pub(crate) default: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct FactorsResponse {
    pub(crate) factors: Vec<FactorSpec>,
    pub(crate) answer_scale: AnswerScale,
}

#[derive(Debug, Serialize)]
pub(crate) struct DistrictsResponse {
    pub(crate) districts: Vec<DistrictView>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DiagnosticsQuery {
    #[serde(default)]
    pub(crate) top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DistrictDiagnosticsResponse {
    pub(crate) district: String,
    pub(crate) top_k: usize,
    pub(crate) contributions: Vec<NegativeContribution>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DiagnosticsReportResponse {
    pub(crate) top_k: usize,
    pub(crate) reports: Vec<DistrictNegativeReport>,
}

pub(crate) fn api_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/factors", get(factors_endpoint))
        .route("/api/v1/districts", get(districts_endpoint))
        .route("/api/v1/recommendations", post(recommendation_endpoint))
        .route("/api/v1/diagnostics", get(diagnostics_report_endpoint))
        .route("/api/v1/diagnostics/:district", get(district_diagnostics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if !state.readiness.load(Ordering::Relaxed) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        );
    }

    match state.services.service() {
        Ok(service) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "districts": service.table().len() })),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "error": err.to_string() })),
        ),
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn factors_endpoint(Extension(state): Extension<AppState>) -> Json<FactorsResponse> {
    Json(FactorsResponse {
        factors: state.services.schema().factors().to_vec(),
        answer_scale: AnswerScale {
            min: MIN_ANSWER,
            max: MAX_ANSWER,
            default: DEFAULT_ANSWER,
        },
    })
}

pub(crate) async fn districts_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<DistrictsResponse>, AppError> {
    let service = state.services.service()?;
    Ok(Json(DistrictsResponse {
        districts: service.districts(),
    }))
}

pub(crate) async fn recommendation_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RecommendationPayload>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let RecommendationPayload {
        answers,
        tier,
        limit,
    } = payload;

    let service = state.services.service()?;
    let schema = service.schema();
    let answers = SurveyAnswers::from_map(schema, answers)?.fill_missing(schema, DEFAULT_ANSWER);
    let tier = tier
        .unwrap_or(TierSelection::Only(state.defaults.tier))
        .tier();

    let request = RecommendationRequest::new(answers)
        .with_tier(tier)
        .with_limit(limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT));
    let recommendation = service.recommend(&request)?;

    Ok(Json(RecommendationResponse {
        generated_at: Utc::now(),
        tier,
        tier_label: tier.map(PriceTier::label),
        weights: recommendation.weight_views(),
        zero_weights: recommendation.weights.is_zero(),
        recommendations: recommendation.top,
        ranking: recommendation.ranking.entries().to_vec(),
    }))
}

pub(crate) async fn district_diagnostics_endpoint(
    Extension(state): Extension<AppState>,
    Path(district): Path<String>,
    Query(query): Query<DiagnosticsQuery>,
) -> Result<Json<DistrictDiagnosticsResponse>, AppError> {
    let top_k = resolve_top_k(&state, query.top_k)?;
    let report = state.services.service()?.diagnose(&district, top_k)?;

    Ok(Json(DistrictDiagnosticsResponse {
        district: report.district,
        top_k,
        contributions: report.contributions,
    }))
}

pub(crate) async fn diagnostics_report_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<DiagnosticsQuery>,
) -> Result<Json<DiagnosticsReportResponse>, AppError> {
    let top_k = resolve_top_k(&state, query.top_k)?;
    let reports = state.services.service()?.diagnose_all(top_k)?;
    Ok(Json(DiagnosticsReportResponse { top_k, reports }))
}

fn resolve_top_k(state: &AppState, requested: Option<usize>) -> Result<usize, AppError> {
    let max = state.defaults.max_top_k;
    let top_k = requested.unwrap_or_else(|| DEFAULT_DIAGNOSTIC_TOP_K.min(max));
    Ok(validate_top_k(top_k, max)?)
}
