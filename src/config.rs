//! Upstream source configuration.
//!
//! All source lists (countries, symbols, feeds, channels) live here and are
//! handed explicitly to each aggregator, so tests and deployments can swap
//! them without touching the fetch code. The file format is YAML; every field
//! has a default, so an empty file (or no file at all) yields the built-in
//! dashboard sources.
//!
//! ```yaml
//! fires:
//!   region:
//!     bounding_box: { west: 44.0, south: 22.0, east: 60.0, north: 31.0 }
//! prices:
//!   symbols: ["BZ=F", "CL=F"]
//! youtube:
//!   channels:
//!     - { handle: "@SkyNews", name: "Sky News", fallback: "YDvsBbKfLPA" }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

const BROWSER_UA: &str = "Mozilla/5.0";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub fires: FiresConfig,
    pub prices: PricesConfig,
    pub rss: RssConfig,
    pub youtube: YoutubeConfig,
}

/// Which area the fire feed covers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FireRegion {
    /// One request per ISO-3 country code; failures are tolerated per country.
    Countries(Vec<String>),
    /// One request for a single area; a failure fails the endpoint.
    BoundingBox(BoundingBox),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FiresConfig {
    pub api_base: String,
    /// Satellite product, e.g. `VIIRS_SNPP_NRT`.
    pub product: String,
    /// Look-back window in days.
    pub days: u8,
    /// Written as a one-key map: `countries: [...]` or `bounding_box: {...}`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub region: FireRegion,
    pub timeout_ms: u64,
    /// Server-held FIRMS map key. Normally supplied via CLI/env, not YAML.
    #[serde(skip_serializing)]
    pub map_key: Option<String>,
}

impl Default for FiresConfig {
    fn default() -> Self {
        Self {
            api_base: "https://firms.modaps.eosdis.nasa.gov".to_string(),
            product: "VIIRS_SNPP_NRT".to_string(),
            days: 1,
            region: FireRegion::Countries(
                ["IRN", "IRQ", "SAU", "ARE", "QAT", "OMN", "KWT", "BHR"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
            timeout_ms: 10_000,
            map_key: None,
        }
    }
}

impl FiresConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PricesConfig {
    pub symbols: Vec<String>,
    pub primary_base: String,
    pub mirror_base: String,
    pub interval: String,
    pub range: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BZ=F".into(), "CL=F".into(), "TTF=F".into()],
            primary_base: "https://query1.finance.yahoo.com".to_string(),
            mirror_base: "https://query2.finance.yahoo.com".to_string(),
            interval: "1d".to_string(),
            range: "2d".to_string(),
            user_agent: BROWSER_UA.to_string(),
            timeout_ms: 8_000,
        }
    }
}

impl PricesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RssConfig {
    pub feeds: Vec<String>,
    pub max_items: usize,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            feeds: vec![
                "https://news.google.com/rss/search?q=iran+hormuz+oil+strait+middle+east+when:7d&hl=en-US&gl=US&ceid=US:en".to_string(),
                "https://news.google.com/rss/search?q=oil+price+crude+OPEC+energy+when:3d&hl=en-US&gl=US&ceid=US:en".to_string(),
            ],
            max_items: 30,
            user_agent: BROWSER_UA.to_string(),
            timeout_ms: 8_000,
        }
    }
}

impl RssConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A channel whose live stream the dashboard embeds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Channel handle including the `@`, used as the response key.
    pub handle: String,
    pub name: String,
    /// Video id reported when no live stream can be detected.
    pub fallback: String,
}

impl ChannelConfig {
    fn new(handle: &str, name: &str, fallback: &str) -> Self {
        Self {
            handle: handle.to_string(),
            name: name.to_string(),
            fallback: fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_ms: u64,
    pub channels: Vec<ChannelConfig>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            user_agent: "Mozilla/5.0 (compatible; HormuzDashboard/1.0)".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_ms: 8_000,
            channels: vec![
                ChannelConfig::new("@AlJazeeraEnglish", "Al Jazeera", "gCNeDWCI0vo"),
                ChannelConfig::new("@Bloomberg", "Bloomberg", "iEpJwprxDdk"),
                ChannelConfig::new("@SkyNews", "Sky News", "YDvsBbKfLPA"),
            ],
        }
    }
}

impl YoutubeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn channel(&self, handle: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.handle == handle)
    }

    pub fn handles(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.handle.clone()).collect()
    }
}

impl ProxyConfig {
    /// Parse YAML and validate base URLs.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bases = [
            ("fires.api_base", &self.fires.api_base),
            ("prices.primary_base", &self.prices.primary_base),
            ("prices.mirror_base", &self.prices.mirror_base),
            ("youtube.base_url", &self.youtube.base_url),
        ];
        for (field, value) in bases {
            Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
                field,
                value: value.clone(),
            })?;
        }
        for feed in &self.rss.feeds {
            Url::parse(feed).map_err(|_| ConfigError::InvalidUrl {
                field: "rss.feeds",
                value: feed.clone(),
            })?;
        }
        Ok(())
    }
}

/// Load configuration from `path`, or the built-in defaults when `None`.
#[instrument(level = "info")]
pub fn load_config(path: Option<&str>) -> Result<ProxyConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using built-in sources");
        return Ok(ProxyConfig::default());
    };
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    let config = ProxyConfig::from_yaml(&yaml)?;
    info!(
        symbols = config.prices.symbols.len(),
        feeds = config.rss.feeds.len(),
        channels = config.youtube.channels.len(),
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_dashboard_sources() {
        let config = ProxyConfig::default();
        assert_eq!(config.prices.symbols, vec!["BZ=F", "CL=F", "TTF=F"]);
        assert_eq!(config.rss.feeds.len(), 2);
        assert_eq!(config.rss.max_items, 30);
        assert_eq!(config.youtube.handles(), vec!["@AlJazeeraEnglish", "@Bloomberg", "@SkyNews"]);
        assert!(matches!(config.fires.region, FireRegion::Countries(ref c) if c.len() == 8));
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = ProxyConfig::from_yaml("{}").unwrap();
        assert_eq!(config.fires.timeout_ms, 10_000);
        assert_eq!(config.prices.mirror_base, "https://query2.finance.yahoo.com");
    }

    #[test]
    fn partial_yaml_overrides_only_given_fields() {
        let yaml = r#"
fires:
  region:
    bounding_box: { west: 44.0, south: 22.0, east: 60.0, north: 31.0 }
prices:
  symbols: ["CL=F"]
youtube:
  channels:
    - { handle: "@SkyNews", name: "Sky News", fallback: "YDvsBbKfLPA" }
"#;
        let config = ProxyConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.fires.region,
            FireRegion::BoundingBox(BoundingBox {
                west: 44.0,
                south: 22.0,
                east: 60.0,
                north: 31.0
            })
        );
        assert_eq!(config.fires.product, "VIIRS_SNPP_NRT");
        assert_eq!(config.prices.symbols, vec!["CL=F"]);
        assert_eq!(config.prices.timeout_ms, 8_000);
        assert!(config.youtube.channel("@SkyNews").is_some());
        assert!(config.youtube.channel("@Bloomberg").is_none());
    }

    #[test]
    fn countries_region_uses_map_form() {
        let config = ProxyConfig::from_yaml("fires:\n  region:\n    countries: [IRN, OMN]\n").unwrap();
        assert_eq!(
            config.fires.region,
            FireRegion::Countries(vec!["IRN".to_string(), "OMN".to_string()])
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ProxyConfig::from_yaml("prices:\n  mirror_base: not a url\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidUrl { field: "prices.mirror_base", .. }
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_config(Some("/nonexistent/dashboard.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
