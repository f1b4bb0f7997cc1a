use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::models::job::RecordSet;
use crate::models::query::{QueryState, SortKey, DEFAULT_SALARY_CEILING, DEFAULT_SALARY_FLOOR};
use crate::services::debounce::Debouncer;
use crate::services::listing_service::{
    apply_filters, run_query, total_pages, ListingPage, DEFAULT_PAGE_SIZE,
};

/// Which multi-select filter a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGroup {
    Category,
    Location,
    Experience,
}

/// Single owner of the record set and query state for one listing view.
///
/// Filter, search and reset mutations send the view back to page 1. Sort
/// changes keep the page. Whenever the result count drops, the current page
/// is pulled back inside `[1, total_pages]`.
#[derive(Debug, Clone)]
pub struct ListingController {
    records: Arc<RecordSet>,
    state: QueryState,
    page_size: usize,
    total: usize,
}

impl ListingController {
    pub fn new(records: Arc<RecordSet>) -> Self {
        Self::with_page_size(records, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(records: Arc<RecordSet>, page_size: usize) -> Self {
        let mut controller = Self {
            records,
            state: QueryState::default(),
            page_size: page_size.max(1),
            total: 0,
        };
        controller.refresh();
        controller
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total, self.page_size)
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.state.search_term = term.trim().to_lowercase();
        self.criteria_changed();
    }

    pub fn set_selection<I, S>(&mut self, group: FilterGroup, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.group_mut(group) = values.into_iter().map(Into::into).collect();
        self.criteria_changed();
    }

    /// Checkbox semantics: `checked` adds the value, unchecked removes it.
    pub fn toggle(&mut self, group: FilterGroup, value: &str, checked: bool) {
        let set = self.group_mut(group);
        if checked {
            set.insert(value.to_string());
        } else {
            set.remove(value);
        }
        self.criteria_changed();
    }

    /// Bounds in 万円. `None` falls back to the unrestricted default.
    pub fn set_salary_range(&mut self, floor: Option<i64>, ceiling: Option<i64>) {
        self.state.salary_floor = floor.unwrap_or(DEFAULT_SALARY_FLOOR);
        self.state.salary_ceiling = ceiling.unwrap_or(DEFAULT_SALARY_CEILING);
        self.criteria_changed();
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.state.sort_key = key;
        self.refresh();
    }

    /// Jumps to page `page`, kept within the current page range.
    pub fn set_page(&mut self, page: usize) {
        self.state.current_page = page.clamp(1, self.total_pages());
    }

    /// Returns `false` when already on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.state.current_page.saturating_mul(self.page_size) < self.total {
            self.state.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Returns `false` when already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.state.current_page > 1 {
            self.state.current_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.refresh();
    }

    /// Swaps in a freshly loaded record set, keeping the criteria.
    pub fn replace_records(&mut self, records: Arc<RecordSet>) {
        self.records = records;
        self.refresh();
    }

    pub fn view(&self) -> ListingPage {
        run_query(self.records.records(), &self.state, self.page_size)
    }

    fn group_mut(&mut self, group: FilterGroup) -> &mut BTreeSet<String> {
        match group {
            FilterGroup::Category => &mut self.state.categories,
            FilterGroup::Location => &mut self.state.locations,
            FilterGroup::Experience => &mut self.state.experience_levels,
        }
    }

    fn criteria_changed(&mut self) {
        self.state.current_page = 1;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.total = apply_filters(self.records.records(), &self.state).len();
        let pages = self.total_pages();
        if self.state.current_page > pages {
            self.state.current_page = pages;
        }
        if self.state.current_page == 0 {
            self.state.current_page = 1;
        }
    }
}

/// A controller driven by raw input events. Typing into the search box and
/// the salary fields is debounced; everything else applies at once. Each
/// applied change publishes a fresh [`ListingPage`].
#[derive(Clone)]
pub struct ListingSession {
    controller: Arc<Mutex<ListingController>>,
    views: watch::Sender<ListingPage>,
    search: Debouncer,
    salary: Debouncer,
}

impl ListingSession {
    pub fn new(controller: ListingController, search_delay: Duration, salary_delay: Duration) -> Self {
        let (views, _) = watch::channel(controller.view());
        Self {
            controller: Arc::new(Mutex::new(controller)),
            views,
            search: Debouncer::new(search_delay),
            salary: Debouncer::new(salary_delay),
        }
    }

    /// Page size and input delays taken from the service configuration.
    pub fn from_config(records: Arc<RecordSet>, config: &Config) -> Self {
        Self::new(
            ListingController::with_page_size(records, config.page_size),
            config.search_debounce,
            config.salary_debounce,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingPage> {
        self.views.subscribe()
    }

    pub fn current_view(&self) -> ListingPage {
        self.views.borrow().clone()
    }

    /// Keystroke in the search box.
    pub fn input_search(&self, term: impl Into<String>) -> JoinHandle<bool> {
        let term = term.into();
        let session = self.clone();
        self.search.call(move || session.apply(|c| c.set_search_term(&term)))
    }

    /// Enter key or search button: apply immediately and drop pending input.
    pub fn submit_search(&self, term: &str) {
        self.search.cancel();
        self.apply(|c| c.set_search_term(term));
    }

    pub fn input_salary(&self, floor: Option<i64>, ceiling: Option<i64>) -> JoinHandle<bool> {
        let session = self.clone();
        self.salary
            .call(move || session.apply(|c| c.set_salary_range(floor, ceiling)))
    }

    /// Runs a mutation now and publishes the resulting view.
    pub fn apply<R>(&self, mutate: impl FnOnce(&mut ListingController) -> R) -> R {
        let mut controller = self
            .controller
            .lock()
            .expect("listing controller mutex poisoned");
        let result = mutate(&mut *controller);
        let view = controller.view();
        drop(controller);
        tracing::debug!(total = view.total, page = view.page, "listing view updated");
        self.views.send_replace(view);
        result
    }

    pub fn reset(&self) {
        self.search.cancel();
        self.salary.cancel();
        self.apply(ListingController::reset);
    }
}
