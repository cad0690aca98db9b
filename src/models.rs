//! Normalized records returned to the dashboard.
//!
//! This module defines the value objects every endpoint produces:
//! - [`FireDetection`]: one satellite fire hotspot
//! - [`PriceQuote`]: latest price and daily change for one instrument
//! - [`NewsItem`]: one deduplicated headline
//! - [`LiveChannelStatus`]: current live video for one channel
//!
//! Records are built fresh for each request and never stored. The serialized
//! field names match the JSON the dashboard client reads (`lat`, `changePct`,
//! `pubDate`, ...), hence the `#[serde(rename)]` attributes.

use serde::{Deserialize, Serialize};

/// Detection confidence. Low-confidence rows never become records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Nominal,
    High,
}

/// A single fire hotspot reported by the satellite feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireDetection {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Brightness temperature (I-4 channel, Kelvin); `0` when unreported.
    pub brightness: f64,
    pub confidence: Confidence,
    /// `"<acq_date> HH:MM UTC"`.
    #[serde(rename = "datetime")]
    pub timestamp: String,
}

/// Latest quote for one tracked instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePct")]
    pub change_percent: f64,
    pub currency: String,
}

/// A news headline from one of the configured feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Tag-stripped, entity-unescaped title.
    pub title: String,
    pub link: String,
    /// Publication date as the feed wrote it.
    #[serde(rename = "pubDate")]
    pub published_at: String,
    pub source: String,
}

impl NewsItem {
    /// Deduplication key: lowercase of the first 50 characters of the title.
    pub fn dedup_key(&self) -> String {
        self.title.chars().take(50).collect::<String>().to_lowercase()
    }
}

/// Where a [`LiveChannelStatus`] video id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Scraped,
    Fallback,
}

/// Live-stream status of a configured channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveChannelStatus {
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "live")]
    pub is_live: bool,
    #[serde(rename = "source")]
    pub origin: Origin,
}

impl LiveChannelStatus {
    pub fn scraped(video_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            display_name: display_name.into(),
            is_live: true,
            origin: Origin::Scraped,
        }
    }

    pub fn fallback(video_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            display_name: display_name.into(),
            is_live: false,
            origin: Origin::Fallback,
        }
    }
}
