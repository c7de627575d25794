//! Interpretation of raw API responses.
//!
//! [`parse_response`] separates transport problems from usable payloads, and
//! [`api_error::detect_api_error`] looks inside a usable payload for an explicit
//! refusal by the API.

pub mod api_error;

use serde_json::Value;

use crate::fetcher::{RawResponse, TransportFailure};

pub use api_error::{detect_api_error, ApiRejection};

/// A successfully framed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The API answered with no body at all, which it does for zero matches.
    Empty,
    Data(Value),
}

pub fn parse_response(response: &RawResponse) -> Result<Payload, TransportFailure> {
    if !response.is_success() {
        return Err(TransportFailure::Status(response.status));
    }

    let body = response.body.trim();
    if body.is_empty() {
        return Ok(Payload::Empty);
    }

    serde_json::from_str(body)
        .map(Payload::Data)
        .map_err(|e| TransportFailure::Malformed(e.to_string()))
}
