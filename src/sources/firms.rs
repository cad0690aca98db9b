//! Satellite fire hotspots from the NASA FIRMS CSV API.
//!
//! Two deployment shapes are supported (see [`FireRegion`]):
//!
//! - **Countries**: one request per country code, fanned out concurrently.
//!   A failed country is logged and contributes nothing.
//! - **Bounding box**: one request for the whole area. With a single source
//!   there is nothing to degrade to, so a failure becomes a `502`.
//!
//! # URL Pattern
//!
//! ```text
//! {api_base}/api/country/csv/{key}/{product}/{ISO3}/{days}
//! {api_base}/api/area/csv/{key}/{product}/{west},{south},{east},{north}/{days}
//! ```

use crate::config::{BoundingBox, FireRegion, FiresConfig};
use crate::error::{ApiError, FetchError};
use crate::fetch::{HttpClient, HttpRequest, bounded_fetch};
use crate::models::{Confidence, FireDetection};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

static HHMM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2})(\d{2})").unwrap());

/// Column positions resolved from the header row.
struct Columns {
    latitude: usize,
    longitude: usize,
    brightness: Option<usize>,
    confidence: Option<usize>,
    date: Option<usize>,
    time: Option<usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        let names: Vec<String> = header
            .split(',')
            .map(|h| h.trim().to_lowercase())
            .collect();
        let find = |name: &str| names.iter().position(|h| h == name);

        Some(Self {
            latitude: find("latitude")?,
            longitude: find("longitude")?,
            brightness: find("bright_ti4"),
            confidence: find("confidence"),
            date: find("acq_date"),
            time: find("acq_time"),
            width: names.len(),
        })
    }
}

/// Parse FIRMS CSV text into fire detections.
///
/// Rows that are short, low-confidence or carry an unparseable coordinate are
/// skipped silently. A body without a data row, or without latitude/longitude
/// columns, yields an empty list.
pub fn parse_csv(csv: &str) -> Vec<FireDetection> {
    let mut lines = csv.trim().lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let Some(columns) = Columns::from_header(header) else {
        debug!("CSV header lacks latitude/longitude columns");
        return Vec::new();
    };

    lines
        .filter_map(|line| parse_row(&columns, line.trim_end_matches('\r')))
        .collect()
}

fn parse_row(columns: &Columns, line: &str) -> Option<FireDetection> {
    let cols: Vec<&str> = line.split(',').collect();
    if cols.len() < columns.width {
        return None;
    }
    let field = |idx: Option<usize>| idx.and_then(|i| cols.get(i)).map_or("", |v| v.trim());

    let confidence = match field(columns.confidence).to_lowercase().as_str() {
        "low" | "l" => return None,
        "high" | "h" => Confidence::High,
        _ => Confidence::Nominal,
    };
    let latitude = parse_finite(cols[columns.latitude])?;
    let longitude = parse_finite(cols[columns.longitude])?;
    let brightness = parse_finite(field(columns.brightness)).unwrap_or(0.0);

    Some(FireDetection {
        latitude,
        longitude,
        brightness,
        confidence,
        timestamp: format_timestamp(field(columns.date), field(columns.time)),
    })
}

/// `NaN` and infinities parse as `f64` but are not usable values.
fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `("2024-01-15", "945")` → `"2024-01-15 09:45 UTC"`.
fn format_timestamp(date: &str, time: &str) -> String {
    let padded = format!("{time:0>4}");
    let hhmm = HHMM_RE.replacen(&padded, 1, "$1:$2");
    format!("{date} {hhmm} UTC")
}

fn country_url(config: &FiresConfig, key: &str, country: &str) -> String {
    format!(
        "{}/api/country/csv/{}/{}/{}/{}",
        config.api_base.trim_end_matches('/'),
        key,
        config.product,
        country,
        config.days
    )
}

fn area_url(config: &FiresConfig, key: &str, bbox: &BoundingBox) -> String {
    format!(
        "{}/api/area/csv/{}/{}/{},{},{},{}/{}",
        config.api_base.trim_end_matches('/'),
        key,
        config.product,
        bbox.west,
        bbox.south,
        bbox.east,
        bbox.north,
        config.days
    )
}

/// Fetch and parse one FIRMS CSV.
#[instrument(level = "info", skip_all, fields(%url))]
async fn fetch_region(
    client: &dyn HttpClient,
    url: String,
    config: &FiresConfig,
) -> Result<Vec<FireDetection>, FetchError> {
    let body = bounded_fetch(client, HttpRequest::get(url, config.timeout())).await?;
    let fires = parse_csv(&body);
    debug!(count = fires.len(), "Parsed FIRMS CSV");
    Ok(fires)
}

/// Collect fire detections for the configured region.
///
/// # Errors
///
/// Only in bounding-box mode: [`ApiError::Upstream`] when the single area
/// request fails or no map key is configured.
#[instrument(level = "info", skip_all)]
pub async fn fetch_fires(
    client: &dyn HttpClient,
    config: &FiresConfig,
) -> Result<Vec<FireDetection>, ApiError> {
    let key = config.map_key.as_deref().filter(|k| !k.is_empty());

    match &config.region {
        FireRegion::Countries(countries) => {
            let Some(key) = key else {
                warn!("FIRMS map key not configured; returning no fires");
                return Ok(Vec::new());
            };

            let per_country = join_all(countries.iter().map(|country| async move {
                match fetch_region(client, country_url(config, key, country), config).await {
                    Ok(fires) => fires,
                    Err(e) => {
                        warn!(%country, error = %e, "FIRMS country fetch failed; skipping");
                        Vec::new()
                    }
                }
            }))
            .await;

            let fires: Vec<FireDetection> = per_country.into_iter().flatten().collect();
            info!(countries = countries.len(), count = fires.len(), "Collected FIRMS detections");
            Ok(fires)
        }
        FireRegion::BoundingBox(bbox) => {
            let Some(key) = key else {
                error!("FIRMS map key not configured");
                return Err(ApiError::Upstream("Fire data source not configured".to_string()));
            };
            let fires = fetch_region(client, area_url(config, key, bbox), config)
                .await
                .map_err(|e| {
                    error!(error = %e, "FIRMS area fetch failed");
                    ApiError::Upstream(format!("Fire data unavailable: {e}"))
                })?;
            info!(count = fires.len(), "Collected FIRMS detections");
            Ok(fires)
        }
    }
}
