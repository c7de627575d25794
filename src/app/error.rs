use thiserror::Error;

use crate::config::ConfigError;
use crate::fetcher::TransportFailure;
use crate::response::ApiRejection;

#[derive(Error, Debug)]
pub enum TagscrollError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Please provide at least one tag.")]
    EmptyTags,

    #[error("{0}")]
    ApiRejected(ApiRejection),

    #[error("All {attempts} endpoints failed, last error: {last}")]
    EndpointsExhausted {
        attempts: usize,
        last: TransportFailure,
    },

    #[error("{0}")]
    Other(String),
}

impl TagscrollError {
    /// Whether the API itself refused the query, as opposed to the transport failing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, TagscrollError::ApiRejected(_))
    }
}

pub type Result<T> = std::result::Result<T, TagscrollError>;
