use std::net::SocketAddr;
use std::sync::Arc;

use patent_hub::{
    build_router,
    config::{get_config, init_config},
    models::job::RecordSet,
    AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();

    let report = RecordSet::load_from_path(&config.jobs_path, config.record_policy)?;
    let rejected = report.rejected();
    if rejected > 0 {
        warn!(
            rejected,
            path = %config.jobs_path.display(),
            "some job cards were rejected"
        );
    }
    info!(jobs = report.records.len(), "job listings ready");

    let app_state = AppState::new(config, Arc::new(report.records))?;

    if app_state.news_service.is_demo() {
        info!("NEWS_FEED_URL not set; serving the sample news feed");
    }
    app_state
        .news_service
        .spawn_poller(config.news_refresh_interval);

    let app = build_router(app_state, config.public_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
