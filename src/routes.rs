use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::{
    engine::PhishingEngine,
    error::{validation_error, AppError},
    types::{CheckRequest, CheckResponse},
};

pub type AppState = Arc<PhishingEngine>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/check-phishing", post(check_phishing))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn check_phishing(
    State(engine): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, AppError> {
    let Json(request) = payload?;
    let Some(url) = request.url.filter(|url| !url.trim().is_empty()) else {
        warn!("Rejected request without a URL");
        return Err(validation_error("Missing URL parameter"));
    };

    let response = engine.classify(&url).await?;
    Ok(Json(response))
}

pub async fn health_check() -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}
