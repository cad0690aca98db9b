//! # Dashboard Proxy
//!
//! A stateless HTTP proxy that fetches data from third-party providers and
//! normalizes it into small JSON shapes for a client dashboard.
//!
//! ## Endpoints
//!
//! - `/api/fires`: satellite fire hotspots (NASA FIRMS CSV)
//! - `/api/prices`: energy futures quotes (Yahoo Finance, with mirror host)
//! - `/api/rss`: deduplicated news headlines (Google News RSS)
//! - `/api/youtube-live`: live video ids for news channels (page scrape)
//!
//! ## Usage
//!
//! ```sh
//! FIRMS_MAP_KEY=... dashboard_proxy --bind 0.0.0.0:3000 --config sources.yaml
//! ```
//!
//! ## Architecture
//!
//! Every request runs the same pipeline:
//! 1. **Fetch**: bounded GETs to one or more upstreams, in parallel
//! 2. **Parse**: CSV / RSS / HTML / JSON into typed records
//! 3. **Aggregate**: merge, deduplicate, apply fallbacks; partial upstream
//!    failures are absorbed wherever a redundant source exists
//! 4. **Respond**: JSON with CORS and edge-cache headers

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod sources;
mod utils;

use api::{AppState, router};
use cli::Cli;
use config::{FireRegion, load_config};
use fetch::ReqwestHttpClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(bind = %args.bind, config = ?args.config, "Parsed CLI arguments");

    let mut config = load_config(args.config.as_deref())?;
    if args.firms_key.is_some() {
        config.fires.map_key = args.firms_key;
    }
    if config.fires.map_key.is_none() {
        warn!("FIRMS_MAP_KEY not set; /api/fires will have no data");
    }
    let fire_mode = match &config.fires.region {
        FireRegion::Countries(c) => format!("countries({})", c.len()),
        FireRegion::BoundingBox(_) => "bounding_box".to_string(),
    };

    let state = AppState::new(config, Arc::new(ReqwestHttpClient::new()));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(addr = %listener.local_addr()?, %fire_mode, "dashboard_proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
