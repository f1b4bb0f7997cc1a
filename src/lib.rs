pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::models::job::RecordSet;
use crate::services::{
    application_service::ApplicationService,
    listing_service::ListingService,
    news_service::NewsService,
    preference_service::{JsonFilePreferenceStore, PreferenceService},
    share_service::ShareService,
};

#[derive(Clone)]
pub struct AppState {
    pub page_size: usize,
    pub listing_service: ListingService,
    pub preference_service: PreferenceService,
    pub news_service: NewsService,
    pub application_service: ApplicationService,
    pub share_service: ShareService,
}

impl AppState {
    pub fn new(config: &Config, records: Arc<RecordSet>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let preference_service = match &config.preferences_path {
            Some(path) => PreferenceService::new(Arc::new(JsonFilePreferenceStore::open(path)?)),
            None => PreferenceService::in_memory(),
        };

        let mut news_service = NewsService::with_client(config.news_feed_url.clone(), http_client);
        if let Some(path) = &config.news_cache_path {
            news_service = news_service.with_cache_path(path);
        }

        Ok(Self {
            page_size: config.page_size,
            listing_service: ListingService::new(records),
            preference_service,
            news_service,
            application_service: ApplicationService::new(),
            share_service: ShareService::new(&config.public_base_url)?,
        })
    }
}

pub fn build_router(state: AppState, public_rps: u32) -> Router {
    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/:id", get(routes::jobs::get_job))
        .route("/api/jobs/:id/share", get(routes::jobs::share_job))
        .route("/api/jobs/:id/apply", post(routes::jobs::apply_for_job))
        .route(
            "/api/companies/:company/share",
            get(routes::jobs::share_company),
        )
        .route(
            "/api/preferences/:kind",
            get(routes::preferences::list_marked),
        )
        .route(
            "/api/preferences/:kind/:id",
            get(routes::preferences::get_preference),
        )
        .route(
            "/api/preferences/:kind/:id/toggle",
            post(routes::preferences::toggle_preference),
        )
        .route("/api/news", get(routes::news::get_digest))
        .route("/api/news/search", get(routes::news::search_news))
        .route(
            "/api/news/category/:category",
            get(routes::news::news_by_category),
        )
        .route("/api/news/stats", get(routes::news::news_stats))
        .route("/api/news/refresh", post(routes::news::refresh_news))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    base_routes
        .merge(public_api)
        .with_state(state)
        .layer(middleware::cors::public_cors())
        .layer(TraceLayer::new_for_http())
}
