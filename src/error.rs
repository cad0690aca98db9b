//! Error taxonomy for upstream fetches and for client-facing responses.
//!
//! Two layers are kept apart:
//! - [`FetchError`]: what can go wrong talking to an upstream. These are soft
//!   failures; aggregators swallow them into empty lists, `null` quotes or
//!   fallback records.
//! - [`ApiError`]: the small, enumerable set of failures a caller can see.
//!   Each maps to one HTTP status and a one-line JSON body (see
//!   [`crate::outputs::json`]).

use axum::http::StatusCode;
use thiserror::Error;

/// Failure of a single bounded upstream call.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No complete response arrived before the per-call deadline.
    #[error("upstream did not respond within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    /// Connection, TLS or request construction failure.
    #[error("request failed: {0}")]
    Network(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Failure surfaced to the dashboard client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unknown channel")]
    UnknownChannel { channels: Vec<String> },

    /// Single mandatory upstream failed (fires in area mode).
    #[error("{0}")]
    Upstream(String),

    #[error("Failed to fetch feeds")]
    FeedsUnavailable,
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnknownChannel { .. } => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::FeedsUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON error body: `{error}` plus `channels` for unknown channel requests.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::UnknownChannel { channels } => serde_json::json!({
                "error": self.to_string(),
                "channels": channels,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        }
    }
}

/// Configuration loading failure at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid base url for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
}
