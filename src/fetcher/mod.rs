//! Throttled, retrying API access and per-day pagination.
//!
//! The transport seam is a trait so the retry/classification logic and the
//! page walker can be exercised against a scripted transport in tests.

use async_trait::async_trait;
use serde_json::Value;

pub mod client;
pub mod http;
pub mod pagination;
pub mod throttle;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Authoritative rejection by the remote service (bad auth, invalid
    /// params, non-200 status). Never retried.
    #[error("API error ({code}): {message}")]
    Api {
        /// Application-level status code (or HTTP status when the body
        /// carried none).
        code: i64,
        /// Human-readable message from the service, if any.
        message: String,
    },

    /// Transient network faults exhausted the retry budget.
    #[error("transient network failure after {attempts} attempts: {last}")]
    Transient {
        /// Total attempts made.
        attempts: u32,
        /// The fault from the final attempt.
        #[source]
        last: TransportError,
    },

    /// Non-transient transport fault (TLS, malformed body). Not retried.
    #[error("http error: {0}")]
    Http(#[source] TransportError),

    /// The endpoint violated its pagination contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Response payload did not match the expected shape.
    #[error("failed to decode API response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// A raw HTTP-level response: status plus parsed JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
}

/// Transport-level faults, classified for the retry decision.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection-level fault (reset, refused, disconnect). Transient.
    #[error("connection error: {0}")]
    Connect(String),

    /// The request timed out. Transient.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other fault (TLS, body decode). Not transient.
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether this fault class is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }

    /// Classify a reqwest error into a transport fault.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Seam for issuing a single HTTP GET against the platform API, with no
/// throttling or retries of its own. Implemented over reqwest in production
/// and by scripted mocks in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET request and parse the body as JSON.
    async fn get(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, TransportError>;
}
