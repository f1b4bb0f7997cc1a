use std::sync::Arc;

use serde::Serialize;

use crate::models::job::{JobRecord, RecordSet};
use crate::models::query::{QueryState, SortKey, REMOTE_MARKERS};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Records matching every active criterion of `state`, in input order.
pub fn apply_filters<'a>(records: &'a [JobRecord], state: &QueryState) -> Vec<&'a JobRecord> {
    let term = state.normalized_search_term();
    let floor = state.salary_floor_scaled();
    let ceiling = state.salary_ceiling_scaled();
    let wants_remote = state.wants_remote();

    records
        .iter()
        .filter(|job| term.is_empty() || job.search_text().contains(&term))
        .filter(|job| state.categories.is_empty() || state.categories.contains(&job.category))
        .filter(|job| {
            state.locations.is_empty()
                || state
                    .locations
                    .iter()
                    .any(|loc| job.location.contains(loc.as_str()))
                || (wants_remote
                    && REMOTE_MARKERS
                        .iter()
                        .any(|marker| job.location.contains(marker)))
        })
        .filter(|job| {
            state.experience_levels.is_empty() || state.experience_levels.contains(&job.experience)
        })
        .filter(|job| job.salary_min >= floor && job.salary_max <= ceiling)
        .collect()
}

/// Stable sort: records that compare equal keep their input order.
pub fn apply_sort(records: &mut [&JobRecord], key: SortKey) {
    match key {
        // undated records compare as `None`, which orders last when descending
        SortKey::Newest | SortKey::Updated => {
            records.sort_by(|a, b| b.posted_date.cmp(&a.posted_date))
        }
        SortKey::SalaryDesc => records.sort_by(|a, b| b.salary_max.cmp(&a.salary_max)),
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Returns the requested page and the total page count. A page past the end is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, usize) {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let pages = total_pages(items.len(), page_size);
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return (Vec::new(), pages);
    }
    let end = (start + page_size).min(items.len());
    (items[start..end].to_vec(), pages)
}

/// Criteria back to their load-time defaults.
pub fn reset_query_state(_state: &QueryState) -> QueryState {
    QueryState::default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub items: Vec<JobRecord>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub sort: SortKey,
}

/// Filter, sort and paginate in one pass, without clamping the page.
pub fn run_query(records: &[JobRecord], state: &QueryState, page_size: usize) -> ListingPage {
    let page_size = page_size.max(1);
    let mut matched = apply_filters(records, state);
    apply_sort(&mut matched, state.sort_key);
    let total = matched.len();
    let page = state.current_page.max(1);
    let (slice, total_pages) = paginate(&matched, page, page_size);

    ListingPage {
        items: slice.into_iter().cloned().collect(),
        total,
        page,
        per_page: page_size,
        total_pages,
        has_prev: page > 1,
        has_next: page < total_pages,
        sort: state.sort_key,
    }
}

#[derive(Clone)]
pub struct ListingService {
    records: Arc<RecordSet>,
}

impl ListingService {
    pub fn new(records: Arc<RecordSet>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &Arc<RecordSet> {
        &self.records
    }

    pub fn query(&self, state: &QueryState, page_size: usize) -> ListingPage {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let page = run_query(self.records.records(), state, page_size);
        tracing::debug!(
            total = page.total,
            page = page.page,
            total_pages = page.total_pages,
            sort = page.sort.as_str(),
            "listing query"
        );
        page
    }

    pub fn get_by_id(&self, id: &str) -> Option<&JobRecord> {
        self.records.get(id)
    }
}
