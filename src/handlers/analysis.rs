use std::str::FromStr;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{AnalysisReport, MetadataField, Recommendation},
    seo,
    state::AppState,
};

// ── Query params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub url: String,
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /analyze?url=<encoded-url>
///
/// Fetches the page and returns its metadata, the missing important fields
/// and a recommendation per missing field. Fails with 400 on an invalid URL
/// (no fetch attempted) and 502 when the page cannot be retrieved.
pub async fn analyze_page(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeQuery>,
) -> AppResult<Json<AnalysisReport>> {
    let report = seo::analyze_report(state.fetcher.as_ref(), &params.url).await?;
    Ok(Json(report))
}

/// GET /analyze/export?url=<encoded-url>
///
/// Same analysis, but returns only the metadata record as a downloadable,
/// timestamped JSON file.
pub async fn export_metadata(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeQuery>,
) -> AppResult<Response> {
    let record = seo::analyze(state.fetcher.as_ref(), &params.url).await?;

    let body = serde_json::to_vec_pretty(&record).map_err(|e| {
        tracing::error!(error = ?e, "Failed to serialize metadata export");
        AppError::Internal
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export_filename(Utc::now())),
        )
        .body(Body::from(body))
        .map_err(|_| AppError::Internal)
}

/// GET /recommendations/:field
pub async fn get_recommendation(Path(field): Path<String>) -> AppResult<Json<Recommendation>> {
    let field = MetadataField::from_str(&field)
        .map_err(|_| AppError::NotFound(format!("No recommendation for field `{field}`")))?;
    Ok(Json(seo::recommendation_for(field)))
}

// ── Helpers ────────────────────────────────────────────────────────────────

pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("seo-analysis-{}.json", at.timestamp_millis())
}
