use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::preference_dto::{toggle_message, MarkedIdsResponse, PreferenceResponse},
    error::Result,
    services::preference_service::PreferenceKind,
    AppState,
};

#[axum::debug_handler]
pub async fn list_marked(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse> {
    let kind: PreferenceKind = kind.parse()?;
    let ids = state.preference_service.marked_ids(kind)?;
    Ok(Json(MarkedIdsResponse { kind, ids }))
}

#[axum::debug_handler]
pub async fn get_preference(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let kind: PreferenceKind = kind.parse()?;
    let marked = state.preference_service.is_marked(kind, &id)?;
    Ok(Json(PreferenceResponse {
        kind,
        id,
        marked,
        message: None,
    }))
}

#[axum::debug_handler]
pub async fn toggle_preference(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let kind: PreferenceKind = kind.parse()?;
    let marked = state.preference_service.toggle(kind, &id)?;
    Ok(Json(PreferenceResponse {
        kind,
        id,
        marked,
        message: Some(toggle_message(kind, marked).to_string()),
    }))
}
