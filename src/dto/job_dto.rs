use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::job::{JobRecord, RawNumber};
use crate::models::query::{QueryState, SortKey};
use crate::services::listing_service::ListingPage;

/// Query string of `GET /api/jobs`. List filters are comma-separated; salary
/// bounds are in 万円.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobListQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub sort: Option<String>,
}

fn split_list(raw: &Option<String>) -> BTreeSet<String> {
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_salary(raw: &Option<String>, name: &str) -> Result<Option<i64>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => RawNumber::Text(value.to_string())
            .as_int()
            .map(Some)
            .ok_or_else(|| Error::BadRequest(format!("{} must be a number: {}", name, value))),
    }
}

impl JobListQuery {
    pub fn to_query_state(&self) -> Result<QueryState> {
        let mut state = QueryState {
            search_term: self.search.as_deref().unwrap_or_default().trim().to_lowercase(),
            categories: split_list(&self.category),
            locations: split_list(&self.location),
            experience_levels: split_list(&self.experience),
            current_page: self.page.unwrap_or(1).max(1),
            ..QueryState::default()
        };
        if let Some(floor) = parse_salary(&self.salary_min, "salary_min")? {
            state.salary_floor = floor;
        }
        if let Some(ceiling) = parse_salary(&self.salary_max, "salary_max")? {
            state.salary_ceiling = ceiling;
        }
        if let Some(sort) = self.sort.as_deref() {
            state.sort_key = sort.parse::<SortKey>().map_err(Error::BadRequest)?;
        }
        Ok(state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub company: String,
    pub category: String,
    pub location: String,
    pub experience: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub posted_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub items: Vec<JobResponse>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub sort: SortKey,
}

impl From<JobRecord> for JobResponse {
    fn from(value: JobRecord) -> Self {
        Self {
            id: value.id,
            title: value.title,
            company: value.company,
            category: value.category,
            location: value.location,
            experience: value.experience,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            posted_date: value.posted_date,
        }
    }
}

impl From<ListingPage> for JobListResponse {
    fn from(value: ListingPage) -> Self {
        Self {
            items: value.items.into_iter().map(Into::into).collect(),
            total: value.total,
            page: value.page,
            per_page: value.per_page,
            total_pages: value.total_pages,
            has_prev: value.has_prev,
            has_next: value.has_next,
            sort: value.sort,
        }
    }
}
