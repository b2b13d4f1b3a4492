use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracker::{FeedClient, FeedSource, Tracker, TrackerRuntime, load_catalog};

use crate::state::AppState;

mod charts;
mod config;
mod dashboard_config;
mod routes;
mod state;
mod styles;
mod views;

#[tokio::main]
async fn main() -> Result<()> {
    shared::init_tracing!()?;
    let config = shared::load_tracker_config!()?;

    let settings = dashboard_config::load(Path::new(config::SETTINGS_FILE))
        .with_context(|| format!("Failed to load {}", config::SETTINGS_FILE))?;

    let catalog = load_catalog(Path::new(&config.prefectures_path))
        .await
        .context("Failed to load prefecture catalog")?;
    info!(prefectures = catalog.len(), "Loaded prefecture catalog");

    let tracker = Arc::new(Tracker::new(catalog, settings.flash_ticks));
    let feed = FeedClient::new(FeedSource::parse(&config.feed));
    let runtime = TrackerRuntime::start(tracker, feed, settings.runtime_options()).await;

    let state = Arc::new(AppState::new(
        Arc::clone(runtime.tracker()),
        runtime.frames(),
        settings.counts_poll_period(),
    ));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("Server error")?;

    runtime.shutdown().await;
    Ok(())
}
