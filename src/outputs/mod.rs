//! Response generation for the HTTP endpoints.
//!
//! # Submodules
//!
//! - [`json`]: JSON bodies plus the CORS and per-endpoint `Cache-Control`
//!   headers every dashboard endpoint carries

pub mod json;
