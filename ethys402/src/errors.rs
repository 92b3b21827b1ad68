use std::time::Duration;

use http::StatusCode;

use crate::types::AnyJson;

/// Errors returned by [`EthysClient`](crate::client::EthysClient) and the
/// components built on top of it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {timeout:?}: {path}")]
    Timeout { path: String, timeout: Duration },

    /// Connection, TLS or other transport level failure.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    ///
    /// `body` is the parsed JSON error body, or `{"error": <raw text>}` when
    /// the body was not JSON.
    #[error("API error: {status}")]
    Api { status: StatusCode, body: AnyJson },

    /// A 2xx response whose body could not be decoded.
    #[error("Invalid response from {path}: {source}")]
    InvalidResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Caller input rejected before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error(transparent)]
    Core(#[from] ethys402_core::errors::Error),
}

impl ClientError {
    /// HTTP status of an [`ClientError::Api`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
