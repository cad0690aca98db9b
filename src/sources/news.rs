//! Headlines from Google News RSS searches.
//!
//! Feeds are fetched concurrently and parsed with a small regex scanner
//! rather than a full XML parser: only `<item>` blocks and four child tags
//! are needed, and the scanner tolerates both plain text and
//! `<![CDATA[...]]>` content.
//!
//! After parsing, items from every feed are merged, deduplicated on the
//! first 50 characters of the title (first occurrence wins), sorted newest
//! first and truncated.

use crate::config::RssConfig;
use crate::error::{ApiError, FetchError};
use crate::fetch::{HttpClient, HttpRequest, bounded_fetch};
use crate::models::NewsItem;
use crate::utils::strip_html;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_SOURCE: &str = "Google News";

static ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<item>(.*?)</item>").unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| tag_regex("title"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| tag_regex("link"));
static PUB_DATE_RE: Lazy<Regex> = Lazy::new(|| tag_regex("pubDate"));
static SOURCE_RE: Lazy<Regex> = Lazy::new(|| tag_regex("source"));

/// `<tag attr="...">text</tag>` or `<tag><![CDATA[text]]></tag>`.
fn tag_regex(tag: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)<{tag}[^>]*>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</{tag}>"
    ))
    .unwrap()
}

fn extract(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse every `<item>` in an RSS document. Items without a title are dropped.
pub fn parse_rss(xml: &str) -> Vec<NewsItem> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|c| {
            let block = c.get(1)?.as_str();
            let title = extract(&TITLE_RE, block)?;
            Some(NewsItem {
                title: strip_html(&title),
                link: extract(&LINK_RE, block).unwrap_or_default(),
                published_at: extract(&PUB_DATE_RE, block).unwrap_or_default(),
                source: extract(&SOURCE_RE, block).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            })
        })
        .collect()
}

/// Parse an RSS publication date. Unrecognised formats are `None`.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Deduplicate by title prefix, sort newest first, keep `max_items`.
///
/// Undated items sort after every dated one; ties keep encounter order.
pub fn merge_items(items: impl IntoIterator<Item = NewsItem>, max_items: usize) -> Vec<NewsItem> {
    let mut merged: Vec<(Option<DateTime<Utc>>, NewsItem)> = items
        .into_iter()
        .unique_by(NewsItem::dedup_key)
        .map(|item| (parse_pub_date(&item.published_at), item))
        .collect();
    merged.sort_by(|(a, _), (b, _)| b.cmp(a));
    merged.into_iter().take(max_items).map(|(_, item)| item).collect()
}

#[instrument(level = "info", skip(client, config))]
async fn fetch_feed(
    client: &dyn HttpClient,
    config: &RssConfig,
    url: &str,
) -> Result<Vec<NewsItem>, FetchError> {
    let request = HttpRequest::get(url, config.timeout()).with_user_agent(&config.user_agent);
    let xml = bounded_fetch(client, request).await?;
    let items = parse_rss(&xml);
    debug!(count = items.len(), "Parsed RSS feed");
    Ok(items)
}

/// Fetch all configured feeds and merge their items.
///
/// # Errors
///
/// [`ApiError::FeedsUnavailable`] when every configured feed failed.
#[instrument(level = "info", skip_all)]
pub async fn fetch_news(
    client: &dyn HttpClient,
    config: &RssConfig,
) -> Result<Vec<NewsItem>, ApiError> {
    // Results come back in feed order, so dedup favours earlier feeds.
    let results = join_all(config.feeds.iter().map(|url| fetch_feed(client, config, url))).await;

    let mut failed = 0usize;
    let mut collected = Vec::new();
    for (url, result) in config.feeds.iter().zip(results) {
        match result {
            Ok(items) => collected.extend(items),
            Err(e) => {
                failed += 1;
                warn!(%url, error = %e, "RSS feed failed; skipping");
            }
        }
    }

    if !config.feeds.is_empty() && failed == config.feeds.len() {
        error!(feeds = failed, "Every RSS feed failed");
        return Err(ApiError::FeedsUnavailable);
    }

    let total = collected.len();
    let items = merge_items(collected, config.max_items);
    info!(fetched = total, returned = items.len(), failed, "Merged RSS items");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StubHttpClient;

    fn item(title: &str, date: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: String::new(),
            published_at: date.to_string(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    fn rss(items: &[(&str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, date)| {
                format!("<item><title>{title}</title><link>https://n.test/{date}</link><pubDate>{date}</pubDate></item>")
            })
            .collect();
        format!("<?xml version=\"1.0\"?><rss><channel>{body}</channel></rss>")
    }

    #[test]
    fn parses_plain_and_cdata_items() {
        let xml = r#"<rss><channel>
<item>
  <title>Tanker seized near &lt;b&gt;Hormuz&lt;/b&gt; &amp; more</title>
  <link>https://news.test/a</link>
  <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
  <source url="https://reuters.com">Reuters</source>
</item>
<item>
  <title><![CDATA[<b>Brent</b> jumps &quot;3%&quot;]]></title>
  <link><![CDATA[https://news.test/b]]></link>
</item>
<item><title>   </title><link>https://news.test/c</link></item>
</channel></rss>"#;

        let items = parse_rss(xml);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Tanker seized near <b>Hormuz</b> & more");
        assert_eq!(items[0].link, "https://news.test/a");
        assert_eq!(items[0].source, "Reuters");
        assert_eq!(items[0].published_at, "Tue, 02 Jan 2024 10:00:00 GMT");
        assert_eq!(items[1].title, "Brent jumps \"3%\"");
        assert_eq!(items[1].link, "https://news.test/b");
        assert_eq!(items[1].published_at, "");
        assert_eq!(items[1].source, "Google News");
    }

    #[test]
    fn no_items_is_empty() {
        assert!(parse_rss("<rss><channel></channel></rss>").is_empty());
        assert!(parse_rss("not xml at all").is_empty());
    }

    #[test]
    fn parses_known_date_formats() {
        assert!(parse_pub_date("Tue, 02 Jan 2024 10:00:00 GMT").is_some());
        assert!(parse_pub_date("2024-01-02T10:00:00Z").is_some());
        assert!(parse_pub_date("2024-01-02").is_some());
        assert!(parse_pub_date("yesterday").is_none());
        assert!(parse_pub_date("").is_none());
    }

    #[test]
    fn sorts_newest_first() {
        let merged = merge_items(vec![item("older", "2024-01-01"), item("newer", "2024-01-02")], 30);
        let dates: Vec<_> = merged.iter().map(|i| i.published_at.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-01"]);
    }

    #[test]
    fn dedup_keeps_first_occurrence_regardless_of_date() {
        let prefix = "Oil tanker traffic through the Strait of Hormuz is";
        assert_eq!(prefix.chars().count(), 50);
        let merged = merge_items(
            vec![
                item(&format!("{prefix} slowing"), "2024-01-01"),
                item(&format!("{} SURGING", prefix.to_uppercase()), "2024-01-05"),
            ],
            30,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].published_at, "2024-01-01");
    }

    #[test]
    fn undated_items_sort_last_and_truncate() {
        let merged = merge_items(
            vec![item("a", "garbage"), item("b", "2024-01-01"), item("c", "2024-01-03"), item("d", "")],
            3,
        );
        let titles: Vec<_> = merged.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
    }

    fn test_config(feeds: &[&str]) -> RssConfig {
        RssConfig {
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
            timeout_ms: 100,
            ..RssConfig::default()
        }
    }

    #[tokio::test]
    async fn failed_feed_is_isolated() {
        let config = test_config(&["https://f1.test/rss", "https://f2.test/rss", "https://f3.test/rss"]);
        let stub = StubHttpClient::new()
            .ok("https://f1.test/rss", rss(&[("First", "2024-01-01"), ("Shared", "2024-01-02")]))
            .status("https://f2.test/rss", 503)
            .ok("https://f3.test/rss", rss(&[("shared", "2024-01-04"), ("Third", "2024-01-03")]));

        let items = fetch_news(&stub, &config).await.unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Third", "Shared", "First"]);
        assert!(
            stub.calls()
                .iter()
                .all(|r| r.headers.get("user-agent").map(String::as_str) == Some("Mozilla/5.0"))
        );
    }

    #[tokio::test]
    async fn all_feeds_failing_is_an_error() {
        let config = test_config(&["https://f1.test/rss", "https://f2.test/rss"]);
        let stub = StubHttpClient::new()
            .fail("https://f1.test/rss")
            .hang("https://f2.test/rss");

        let err = fetch_news(&stub, &config).await.unwrap_err();
        assert!(matches!(err, ApiError::FeedsUnavailable));
    }
}
