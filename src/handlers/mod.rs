pub mod analysis;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "seo-inspector",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Application routes without middleware. `main` adds metrics, CORS and
/// tracing layers on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/analyze", get(analysis::analyze_page))
        .route("/analyze/export", get(analysis::export_metadata))
        .route(
            "/recommendations/:field",
            get(analysis::get_recommendation),
        )
        .with_state(state)
}
