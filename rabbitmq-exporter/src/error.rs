//! Error types for fetching management API resources.

use std::time::Duration;

use thiserror::Error;

/// Failure to obtain a document from the management API.
///
/// Aborts the collection cycle of the exporter that issued the fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("Request to {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
}

impl FetchError {
    /// Create a transport error.
    pub fn request(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create a body decoding error.
    pub fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// The endpoint whose fetch failed.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Request { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. }
            | Self::Timeout { endpoint, .. } => endpoint,
        }
    }
}
