pub mod config;
pub mod fallback;
pub mod http_fetcher;

use async_trait::async_trait;
use thiserror::Error;

use crate::app::Result;

pub use config::ApiConfig;
pub use fallback::{Attempt, FetchOrchestrator};
pub use http_fetcher::HttpFetcher;

pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";

/// Status and body of one HTTP exchange, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failure of the network path or response framing. Always worth retrying
/// against another endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("request failed: {0}")]
    Request(String),

    #[error("status {0}")]
    Status(u16),

    #[error("malformed data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Fetcher {
    /// Issue a GET and return whatever came back. Non-2xx statuses are not errors
    /// at this level; only a failed exchange is.
    async fn fetch(&self, url: &str) -> Result<RawResponse>;
}
