//! Energy futures quotes from the Yahoo Finance chart API.
//!
//! Each symbol is queried against the primary host; only a non-success HTTP
//! status sends the same query to the mirror host. Anything else (timeout,
//! network error, unusable payload) leaves the symbol as `null`. Symbols are
//! queried concurrently, but primary and mirror are strictly sequential per
//! symbol.
//!
//! A successful primary response with too little data does NOT trigger the
//! mirror.

use crate::config::PricesConfig;
use crate::error::FetchError;
use crate::fetch::{HttpClient, HttpRequest, bounded_fetch};
use crate::models::PriceQuote;
use crate::utils::{round2, truncate_for_log};
use futures::future::join_all;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Option<ChartData>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    currency: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Turn a chart payload into a quote.
///
/// Returns `None` for malformed JSON, a missing result, or fewer than two
/// non-null closes. Zero-valued meta prices count as absent.
pub fn parse_chart(symbol: &str, body: &str) -> Option<PriceQuote> {
    let response: ChartResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            debug!(%symbol, error = %e, body = %truncate_for_log(body, 200), "Unparseable chart payload");
            return None;
        }
    };
    let result = response.chart?.result?.into_iter().next()?;
    let closes: Vec<f64> = result
        .indicators?
        .quote
        .into_iter()
        .next()?
        .close
        .into_iter()
        .flatten()
        .collect();
    if closes.len() < 2 {
        debug!(%symbol, closes = closes.len(), "Not enough closes for a quote");
        return None;
    }

    let meta = result.meta;
    let non_zero = |v: Option<f64>| v.filter(|p| *p != 0.0);
    let price = non_zero(meta.regular_market_price).unwrap_or(closes[closes.len() - 1]);
    let previous_close = non_zero(meta.chart_previous_close).unwrap_or(closes[closes.len() - 2]);
    let change = price - previous_close;
    let change_percent = change / previous_close * 100.0;

    Some(PriceQuote {
        symbol: symbol.to_string(),
        price: round2(price),
        change: round2(change),
        change_percent: round2(change_percent),
        currency: meta.currency.unwrap_or_else(|| "USD".to_string()),
    })
}

fn chart_url(base: &str, symbol: &str, config: &PricesConfig) -> String {
    format!(
        "{}/v8/finance/chart/{}?interval={}&range={}",
        base.trim_end_matches('/'),
        urlencoding::encode(symbol),
        config.interval,
        config.range
    )
}

fn chart_request(url: String, config: &PricesConfig) -> HttpRequest {
    HttpRequest::get(url, config.timeout()).with_user_agent(&config.user_agent)
}

/// Quote one symbol: primary host, then mirror on HTTP failure only.
#[instrument(level = "info", skip(client, config))]
pub async fn fetch_quote(
    client: &dyn HttpClient,
    config: &PricesConfig,
    symbol: &str,
) -> Option<PriceQuote> {
    let primary = chart_url(&config.primary_base, symbol, config);
    let body = match bounded_fetch(client, chart_request(primary, config)).await {
        Ok(body) => body,
        Err(FetchError::Upstream { status }) => {
            warn!(status, "Primary quote host failed; trying mirror");
            let mirror = chart_url(&config.mirror_base, symbol, config);
            match bounded_fetch(client, chart_request(mirror, config)).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "Mirror quote host failed");
                    return None;
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Quote fetch failed");
            return None;
        }
    };
    parse_chart(symbol, &body)
}

/// Quote every configured symbol. Every symbol appears in the result.
#[instrument(level = "info", skip_all)]
pub async fn fetch_quotes(
    client: &dyn HttpClient,
    config: &PricesConfig,
) -> BTreeMap<String, Option<PriceQuote>> {
    let quotes = join_all(config.symbols.iter().map(|symbol| async move {
        (symbol.clone(), fetch_quote(client, config, symbol).await)
    }))
    .await;

    let available = quotes.iter().filter(|(_, q)| q.is_some()).count();
    info!(symbols = quotes.len(), available, "Collected quotes");
    quotes.into_iter().collect()
}
