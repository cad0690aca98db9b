//! Upstream sources feeding the dashboard endpoints.
//!
//! Each submodule owns one provider and follows the same shape:
//!
//! 1. **Fetch**: one or more bounded GETs (see [`crate::fetch`])
//! 2. **Parse**: raw text/HTML/JSON into records from [`crate::models`]
//! 3. **Aggregate**: merge across regions/feeds/symbols/channels, applying
//!    the source's fallback policy
//!
//! # Supported Sources
//!
//! | Source | Module | Format | Failure policy |
//! |--------|--------|--------|----------------|
//! | NASA FIRMS | [`firms`] | CSV | per-country skip; single-area `502` |
//! | Yahoo Finance | [`quotes`] | chart JSON | mirror on HTTP failure, else `null` |
//! | Google News | [`news`] | RSS | per-feed skip; all-failed `500` |
//! | YouTube | [`youtube`] | HTML scrape | configured fallback video |
//!
//! Source lists come from [`crate::config::ProxyConfig`]; nothing here holds
//! state between requests.

pub mod firms;
pub mod news;
pub mod quotes;
pub mod youtube;
