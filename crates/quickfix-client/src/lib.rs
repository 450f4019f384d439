#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! HTTP implementation of the list gateway for the QuickFix admin API.
//!
//! One [`AdminApi`] wraps a pooled HTTP client, the API base URL, and a
//! credential feed; [`RestGateway`]s are cheap typed handles cloned from it,
//! one per screen. Credentials live on a watch channel so a key rotation in
//! the settings screen takes effect on the next request without rebuilding
//! any client. All failures collapse into `GatewayError`, so the controller
//! layer never sees an HTTP type.

use thiserror::Error;

mod auth;
mod rest;

pub use auth::{ApiKeyCredential, AuthFeed, AuthSnapshot};
pub use rest::{AdminApi, ClientConfig, HEADER_API_KEY, HEADER_REQUEST_ID, RestGateway};

/// Failure constructing the admin API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL did not parse, or cannot host paths.
    #[error("invalid base URL '{input}': {detail}")]
    InvalidBaseUrl {
        /// The rejected input.
        input: String,
        /// Parser explanation.
        detail: String,
    },
    /// The API key was not a usable `key_id:secret` pair.
    #[error("invalid API key: {detail}")]
    InvalidApiKey {
        /// What was wrong with it.
        detail: String,
    },
    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    Build {
        /// Builder error from the HTTP stack.
        #[from]
        source: reqwest::Error,
    },
}
