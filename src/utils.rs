//! Small text and number helpers shared by the source parsers.
//!
//! This module provides:
//! - String truncation for logging upstream payloads
//! - HTML tag stripping and entity unescaping for feed titles
//! - Two-decimal rounding for quotes

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Remove markup and decode the five basic HTML entities.
///
/// Tags are stripped first, so escaped markup such as `&lt;b&gt;` survives
/// as literal text. `&amp;` is decoded first, so `&amp;lt;` ends up as `<`.
pub fn strip_html(s: &str) -> String {
    TAG_RE
        .replace_all(s, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// Round to two decimal places; exact halves round up toward +∞.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}
