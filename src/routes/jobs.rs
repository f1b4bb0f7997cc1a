use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::job_dto::{JobListQuery, JobListResponse, JobResponse},
    error::{Error, Result},
    services::application_service::QuickApplyPayload,
    AppState,
};

fn find_job<'a>(state: &'a AppState, id: &str) -> Result<&'a crate::models::job::JobRecord> {
    state
        .listing_service
        .get_by_id(id)
        .ok_or_else(|| Error::NotFound(format!("Job not found: {}", id)))
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("page" = Option<usize>, Query, description = "Page number, 1-based"),
        ("per_page" = Option<usize>, Query, description = "Items per page"),
        ("search" = Option<String>, Query, description = "Free-text search"),
        ("category" = Option<String>, Query, description = "Comma-separated categories"),
        ("location" = Option<String>, Query, description = "Comma-separated locations"),
        ("experience" = Option<String>, Query, description = "Comma-separated experience levels"),
        ("salary_min" = Option<String>, Query, description = "Salary floor in 万円"),
        ("salary_max" = Option<String>, Query, description = "Salary ceiling in 万円"),
        ("sort" = Option<String>, Query, description = "newest, salary-desc or updated")
    ),
    responses(
        (status = 200, description = "One page of matching jobs", body = Json<JobListResponse>),
        (status = 400, description = "Invalid query")
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let criteria = query.to_query_state()?;
    let per_page = query.per_page.unwrap_or(state.page_size);
    let page = state.listing_service.query(&criteria, per_page);
    Ok(Json(JobListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = Json<JobResponse>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let job = find_job(&state, &id)?;
    Ok(Json(JobResponse::from(job.clone())))
}

#[axum::debug_handler]
pub async fn share_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let job = find_job(&state, &id)?;
    Ok(Json(state.share_service.job(job)?))
}

#[axum::debug_handler]
pub async fn share_company(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> Result<impl IntoResponse> {
    let records = state.listing_service.records();
    Ok(Json(state.share_service.company(records, &company)?))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/apply",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    request_body = QuickApplyPayload,
    responses(
        (status = 201, description = "Application received"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn apply_for_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<QuickApplyPayload>,
) -> Result<impl IntoResponse> {
    let job = find_job(&state, &id)?;
    let receipt = state.application_service.submit(job, payload)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
