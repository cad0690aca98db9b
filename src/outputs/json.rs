//! JSON responses for the dashboard endpoints.
//!
//! Every endpoint answers through [`respond`], which attaches:
//! - `Access-Control-Allow-Origin: *`
//! - `Cache-Control: s-maxage=N, stale-while-revalidate=M` for the endpoint
//!
//! A `405` goes out bare, before any endpoint headers. Other errors keep the
//! CORS and cache headers so the browser can read the error body.

use crate::error::ApiError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::debug;

/// Edge cache lifetime for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub s_maxage: u32,
    pub stale_while_revalidate: u32,
}

impl CachePolicy {
    pub const FIRES: Self = Self::new(600, 300);
    pub const PRICES: Self = Self::new(30, 60);
    pub const RSS: Self = Self::new(120, 300);
    pub const YOUTUBE_LIVE: Self = Self::new(240, 60);

    pub const fn new(s_maxage: u32, stale_while_revalidate: u32) -> Self {
        Self {
            s_maxage,
            stale_while_revalidate,
        }
    }

    pub fn header_value(&self) -> String {
        format!(
            "s-maxage={}, stale-while-revalidate={}",
            self.s_maxage, self.stale_while_revalidate
        )
    }
}

fn with_endpoint_headers(mut response: Response, policy: CachePolicy) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Ok(value) = HeaderValue::from_str(&policy.header_value()) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    response
}

/// Serialize an endpoint result into the HTTP response.
pub fn respond<T: Serialize>(policy: CachePolicy, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => with_endpoint_headers((StatusCode::OK, Json(body)).into_response(), policy),
        Err(ApiError::MethodNotAllowed) => ApiError::MethodNotAllowed.into_response(),
        Err(e) => with_endpoint_headers(e.into_response(), policy),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(status = %self.status_code(), error = %self, "Responding with error");
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_policy_header_values() {
        assert_eq!(
            CachePolicy::FIRES.header_value(),
            "s-maxage=600, stale-while-revalidate=300"
        );
        assert_eq!(
            CachePolicy::PRICES.header_value(),
            "s-maxage=30, stale-while-revalidate=60"
        );
        assert_eq!(
            CachePolicy::RSS.header_value(),
            "s-maxage=120, stale-while-revalidate=300"
        );
        assert_eq!(
            CachePolicy::YOUTUBE_LIVE.header_value(),
            "s-maxage=240, stale-while-revalidate=60"
        );
    }

    #[test]
    fn success_carries_cors_and_cache_headers() {
        let response = respond(CachePolicy::RSS, Ok(serde_json::json!({ "items": [] })));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "s-maxage=120, stale-while-revalidate=300"
        );
    }

    #[test]
    fn method_not_allowed_is_bare() {
        let response = respond::<()>(CachePolicy::FIRES, Err(ApiError::MethodNotAllowed));
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[test]
    fn other_errors_keep_endpoint_headers() {
        let response = respond::<()>(CachePolicy::FIRES, Err(ApiError::Upstream("down".into())));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
