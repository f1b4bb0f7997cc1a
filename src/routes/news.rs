use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::news_dto::{NewsRefreshResponse, NewsSearchQuery},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn get_digest(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.news_service.digest()?))
}

#[axum::debug_handler]
pub async fn search_news(
    State(state): State<AppState>,
    Query(query): Query<NewsSearchQuery>,
) -> Result<impl IntoResponse> {
    let keyword = query.q.unwrap_or_default();
    Ok(Json(state.news_service.search(&keyword)?))
}

#[axum::debug_handler]
pub async fn news_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.news_service.by_category(&category)?))
}

#[axum::debug_handler]
pub async fn news_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.news_service.statistics()?))
}

#[axum::debug_handler]
pub async fn refresh_news(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let count = state.news_service.refresh().await?;
    Ok(Json(NewsRefreshResponse {
        count,
        last_update: state.news_service.last_update()?,
    }))
}
