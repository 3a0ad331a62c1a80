use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{CompanyRecord, RiskRequest, SearchRequest, SearchResponse};
use crate::risk::{IndustryKeywords, RiskEngine, RiskScore};
use crate::services::CvrSearchService;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Registry search client with its cache and circuit breaker.
    pub search_service: CvrSearchService,
    /// Industry keyword tables used by the risk engine.
    pub industry_keywords: IndustryKeywords,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let search_service = CvrSearchService::new(&config)?;
        Ok(Self {
            config,
            search_service,
            industry_keywords: IndustryKeywords::default(),
        })
    }
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "cvr-intel-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/search?cvr=&companyName=&personName=
///
/// Exactly one criterion is used; a CVR number wins over names.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    tracing::info!(
        has_cvr = params.cvr.is_some(),
        has_company_name = params.company_name.is_some(),
        has_person_name = params.person_name.is_some(),
        "GET /api/v1/search"
    );

    let response = state
        .search_service
        .search(&params)
        .await
        .context("Registry search")?;
    Ok(Json(response))
}

/// POST /api/v1/risk
///
/// Scores a registry record and optional annual reports.
pub async fn risk(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RiskRequest>,
) -> Result<Json<RiskScore>, AppError> {
    let company = payload
        .company
        .filter(|c| !c.is_null())
        .ok_or_else(|| AppError::InvalidInput("company is required".to_string()))?;

    let record = CompanyRecord::from_source(&company)
        .map_err(|e| AppError::InvalidInput(format!("company is not a registry record: {}", e)))?;

    tracing::info!(
        cvr = ?record.cvr_number,
        reports = payload.financials.as_ref().map(|f| f.records.len()).unwrap_or(0),
        "POST /api/v1/risk"
    );

    let engine = RiskEngine::today().with_industry_keywords(state.industry_keywords.clone());
    let score = engine.assess(&record, payload.financials.as_ref());
    Ok(Json(score))
}
