//! Bounded upstream fetches.
//!
//! Every outbound call goes through [`bounded_fetch`], which wraps an
//! [`HttpClient`] transport with a per-call deadline and status check:
//!
//! - no complete response before the deadline: the in-flight request future
//!   is dropped and [`FetchError::Timeout`] is returned
//! - non-2xx status: [`FetchError::Upstream`]
//! - otherwise the body text
//!
//! The deadline timer lives inside the `tokio::time::timeout` future, so it is
//! released exactly once whether the call succeeds, fails or times out.
//! Sibling calls each own their own timer and never affect one another.

use crate::error::FetchError;
use crate::utils::truncate_for_log;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Outbound GET request with its own deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        self.with_header("user-agent", user_agent)
    }
}

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport used by every source. Swapped for a stub in tests.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, FetchError>> + Send + 'a>>;
}

/// Production transport backed by one shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("dashboard_proxy/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_connect() {
                    FetchError::Network(format!("connection failed: {e}"))
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::Body(e.to_string()))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Perform one GET bounded by `request.timeout`, returning the body on 2xx.
#[instrument(level = "debug", skip_all, fields(url = %request.url))]
pub async fn bounded_fetch(
    client: &dyn HttpClient,
    request: HttpRequest,
) -> Result<String, FetchError> {
    let timeout = request.timeout;
    let response = match tokio::time::timeout(timeout, client.execute(request)).await {
        Ok(result) => result?,
        Err(_) => {
            let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(timeout_ms, "Upstream call timed out; aborted");
            return Err(FetchError::Timeout { timeout_ms });
        }
    };

    if !response.is_success() {
        debug!(
            status = response.status,
            body = %truncate_for_log(&response.body, 200),
            "Upstream returned non-success status"
        );
        return Err(FetchError::Upstream {
            status: response.status,
        });
    }

    debug!(bytes = response.body.len(), "Fetched upstream body");
    Ok(response.body)
}

/// Shared handle to the transport, as held by the server state.
pub type SharedClient = Arc<dyn HttpClient>;


#[cfg(test)]
mod tests {
    use super::testing::StubHttpClient;
    use super::*;
    use std::time::Instant;

    #[test]
    fn headers_are_lowercased() {
        let request = HttpRequest::get("https://example.test", Duration::from_secs(1))
            .with_user_agent("Mozilla/5.0")
            .with_header("Accept-Language", "en-US");
        assert_eq!(
            request.headers.get("user-agent").map(String::as_str),
            Some("Mozilla/5.0")
        );
        assert!(request.headers.contains_key("accept-language"));
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let stub = StubHttpClient::new().ok("https://a.test", "hello");
        let body = bounded_fetch(&stub, HttpRequest::get("https://a.test", Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let stub = StubHttpClient::new().status("https://a.test", 503);
        let err = bounded_fetch(&stub, HttpRequest::get("https://a.test", Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Upstream { status: 503 }));
    }

    #[tokio::test]
    async fn hung_call_times_out() {
        let stub = StubHttpClient::new().hang("https://slow.test");
        let started = Instant::now();
        let err = bounded_fetch(
            &stub,
            HttpRequest::get("https://slow.test", Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_ms: 50 }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn network_failure_propagates() {
        let stub = StubHttpClient::new().fail("https://down.test");
        let err = bounded_fetch(
            &stub,
            HttpRequest::get("https://down.test", Duration::from_secs(1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
