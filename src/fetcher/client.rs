//! Retrying API client.
//!
//! Wraps a [`Transport`] with throttling, bounded retry on transient faults,
//! and classification of the platform's `{code, message, data}` envelope.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::http::GIFT_TYPES_ENDPOINT;
use super::throttle::RequestThrottler;
use super::{FetcherError, FetcherResult, Transport};

/// Standard response envelope shared by all platform endpoints.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Authenticated API client with throttling and bounded retry.
///
/// The retry decision is a pure function of the fault class: transient
/// transport faults (connect, timeout) are retried; an authoritative
/// rejection from the service is surfaced immediately.
pub struct ApiClient<T: Transport> {
    transport: T,
    throttler: RequestThrottler,
    max_retries: u32,
}

impl<T: Transport> ApiClient<T> {
    /// Create a client.
    ///
    /// `max_retries` is the total attempt budget per call, first try
    /// included; it must be at least 1.
    pub fn new(transport: T, throttler: RequestThrottler, max_retries: u32) -> Self {
        Self {
            transport,
            throttler,
            max_retries: max_retries.max(1),
        }
    }

    /// Call an endpoint and return the envelope's `data` payload.
    ///
    /// Every attempt first takes a turn from the throttler, so retries are
    /// spaced like ordinary requests.
    ///
    /// # Errors
    ///
    /// - [`FetcherError::Api`] on a non-200 status or non-zero `code`
    /// - [`FetcherError::Transient`] once the attempt budget is exhausted
    /// - [`FetcherError::Http`] on a non-transient transport fault
    pub async fn call(&self, endpoint: &str, query: &[(String, String)]) -> FetcherResult<Value> {
        let mut last_fault = None;

        for attempt in 1..=self.max_retries {
            self.throttler.await_turn().await;

            match self.transport.get(endpoint, query).await {
                Ok(response) => {
                    debug!(endpoint, attempt, "request succeeded");
                    return Self::classify(response);
                }
                Err(fault) if fault.is_transient() => {
                    warn!(
                        endpoint,
                        attempt,
                        max_attempts = self.max_retries,
                        %fault,
                        "transient fault, will retry"
                    );
                    last_fault = Some(fault);
                }
                Err(fault) => return Err(FetcherError::Http(fault)),
            }
        }

        // SAFETY: the loop runs at least once and only exits with a
        // transient fault recorded.
        Err(FetcherError::Transient {
            attempts: self.max_retries,
            last: last_fault.expect("at least one attempt was made"),
        })
    }

    /// List the platform's gift types. A cheap way to verify the session
    /// cookie still works before starting a long dump.
    pub async fn gift_types(&self) -> FetcherResult<Value> {
        self.call(GIFT_TYPES_ENDPOINT, &[]).await
    }

    /// Classify an HTTP-level response per the platform contract: success is
    /// status 200 with envelope code 0, anything else is an authoritative
    /// rejection and not worth retrying.
    fn classify(response: super::ApiResponse) -> FetcherResult<Value> {
        let envelope: ApiEnvelope =
            serde_json::from_value(response.body).map_err(FetcherError::Decode)?;

        if response.status != 200 || envelope.code != 0 {
            let code = if envelope.code != 0 {
                envelope.code
            } else {
                i64::from(response.status)
            };
            return Err(FetcherError::Api {
                code,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("HTTP status {}", response.status)),
            });
        }

        envelope.data.ok_or_else(|| {
            FetcherError::Protocol("success envelope carried no data payload".to_string())
        })
    }
}
