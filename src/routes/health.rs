use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "jobs": state.listing_service.records().len(),
        "news_demo_mode": state.news_service.is_demo(),
    });
    (StatusCode::OK, Json(body))
}
