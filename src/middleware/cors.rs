use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The static pages are served from another origin and only read or toggle.
pub fn public_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any)
}
