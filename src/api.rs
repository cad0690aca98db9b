//! HTTP surface: the four dashboard endpoints.
//!
//! | Route | Body |
//! |-------|------|
//! | `GET /api/fires` | `[FireDetection]` |
//! | `GET /api/prices` | `{symbol: PriceQuote \| null}` |
//! | `GET /api/rss` | `{items: [NewsItem]}` |
//! | `GET /api/youtube-live[?channel=@handle]` | `{handle: LiveChannelStatus}` or one status |
//!
//! Routes accept any method so that non-GET requests get the JSON `405`
//! rather than axum's empty one. Handlers hold no state beyond the shared
//! config and HTTP client.

use crate::config::ProxyConfig;
use crate::error::ApiError;
use crate::fetch::SharedClient;
use crate::models::NewsItem;
use crate::outputs::json::{CachePolicy, respond};
use crate::sources::{firms, news, quotes, youtube};
use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::Method;
use axum::response::Response;
use axum::routing::any;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub client: SharedClient,
}

impl AppState {
    pub fn new(config: ProxyConfig, client: SharedClient) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewsResponse {
    items: Vec<NewsItem>,
}

/// The first `channel` value of the query string, unless it is empty.
fn channel_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "channel")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn require_get(method: &Method) -> Result<(), ApiError> {
    if method == Method::GET {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/fires", any(fires))
        .route("/api/prices", any(prices))
        .route("/api/rss", any(rss))
        .route("/api/youtube-live", any(youtube_live))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fires(State(state): State<AppState>, method: Method) -> Response {
    let result = match require_get(&method) {
        Ok(()) => firms::fetch_fires(state.client.as_ref(), &state.config.fires).await,
        Err(e) => Err(e),
    };
    respond(CachePolicy::FIRES, result)
}

async fn prices(State(state): State<AppState>, method: Method) -> Response {
    let result = match require_get(&method) {
        Ok(()) => Ok(quotes::fetch_quotes(state.client.as_ref(), &state.config.prices).await),
        Err(e) => Err(e),
    };
    respond(CachePolicy::PRICES, result)
}

async fn rss(State(state): State<AppState>, method: Method) -> Response {
    let result = match require_get(&method) {
        Ok(()) => news::fetch_news(state.client.as_ref(), &state.config.rss)
            .await
            .map(|items| NewsResponse { items }),
        Err(e) => Err(e),
    };
    respond(CachePolicy::RSS, result)
}

async fn youtube_live(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Response {
    if let Err(e) = require_get(&method) {
        return respond::<()>(CachePolicy::YOUTUBE_LIVE, Err(e));
    }
    let client = state.client.as_ref();
    let config = &state.config.youtube;

    match channel_param(query.as_deref()).as_deref() {
        None => respond(
            CachePolicy::YOUTUBE_LIVE,
            Ok(youtube::detect_all(client, config).await),
        ),
        Some(handle) => respond(
            CachePolicy::YOUTUBE_LIVE,
            youtube::detect_channel(client, config, handle).await,
        ),
    }
}
