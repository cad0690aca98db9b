//! Live-stream detection for news channels on YouTube.
//!
//! There is no API call here: the channel's `/live` landing page is scraped.
//! A channel counts as live only when the page yields an 11-character video
//! id AND carries the `"isLiveContent":true` marker. In every other case
//! (fetch failure, non-success status, missing id or marker) the configured
//! fallback video is reported instead.
//!
//! # URL Pattern
//!
//! `https://www.youtube.com/@SkyNews/live`

use crate::config::{ChannelConfig, YoutubeConfig};
use crate::error::ApiError;
use crate::fetch::{HttpClient, HttpRequest, bounded_fetch};
use crate::models::LiveChannelStatus;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

const LIVE_MARKER: &str = r#""isLiveContent":true"#;

static CANONICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""canonicalBaseUrl":"/watch\?v=([a-zA-Z0-9_-]{11})""#).unwrap()
});
static WATCH_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://www\.youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})(?:[&#]|$)").unwrap()
});

/// Video id from the canonical URL, else from the `og:url` meta tag.
pub fn extract_video_id(html: &str) -> Option<String> {
    if let Some(c) = CANONICAL_RE.captures(html) {
        return Some(c[1].to_string());
    }
    let og_url = Selector::parse(r#"meta[property="og:url"]"#).ok()?;
    let document = Html::parse_document(html);
    document
        .select(&og_url)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(|content| WATCH_URL_RE.captures(content).map(|c| c[1].to_string()))
}

pub fn has_live_marker(html: &str) -> bool {
    html.contains(LIVE_MARKER)
}

/// Classify a fetched `/live` page for `channel`.
pub fn classify_page(channel: &ChannelConfig, html: &str) -> LiveChannelStatus {
    match (extract_video_id(html), has_live_marker(html)) {
        (Some(video_id), true) => LiveChannelStatus::scraped(video_id, &channel.name),
        (video_id, live) => {
            debug!(handle = %channel.handle, found_id = video_id.is_some(), live, "Channel not live");
            LiveChannelStatus::fallback(&channel.fallback, &channel.name)
        }
    }
}

fn live_url(config: &YoutubeConfig, handle: &str) -> String {
    format!("{}/{}/live", config.base_url.trim_end_matches('/'), handle)
}

/// Detect the live status of one channel. Never fails: errors yield the fallback.
#[instrument(level = "info", skip(client, config, channel), fields(handle = %channel.handle))]
pub async fn detect_live(
    client: &dyn HttpClient,
    config: &YoutubeConfig,
    channel: &ChannelConfig,
) -> LiveChannelStatus {
    let request = HttpRequest::get(live_url(config, &channel.handle), config.timeout())
        .with_user_agent(&config.user_agent)
        .with_header("accept-language", &config.accept_language);

    match bounded_fetch(client, request).await {
        Ok(html) => {
            let status = classify_page(channel, &html);
            info!(live = status.is_live, video_id = %status.video_id, "Detected channel status");
            status
        }
        Err(e) => {
            warn!(error = %e, "Live page fetch failed; using fallback");
            LiveChannelStatus::fallback(&channel.fallback, &channel.name)
        }
    }
}

/// Detect every configured channel concurrently, keyed by handle.
#[instrument(level = "info", skip_all)]
pub async fn detect_all(
    client: &dyn HttpClient,
    config: &YoutubeConfig,
) -> BTreeMap<String, LiveChannelStatus> {
    join_all(config.channels.iter().map(|channel| async move {
        (channel.handle.clone(), detect_live(client, config, channel).await)
    }))
    .await
    .into_iter()
    .collect()
}

/// Detect a single channel by handle.
///
/// # Errors
///
/// [`ApiError::UnknownChannel`] listing the configured handles.
pub async fn detect_channel(
    client: &dyn HttpClient,
    config: &YoutubeConfig,
    handle: &str,
) -> Result<LiveChannelStatus, ApiError> {
    let Some(channel) = config.channel(handle) else {
        warn!(%handle, "Unknown channel requested");
        return Err(ApiError::UnknownChannel {
            channels: config.handles(),
        });
    };
    Ok(detect_live(client, config, channel).await)
}
