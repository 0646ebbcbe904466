//! reqwest-backed transport and cookie session handling.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{ApiResponse, Transport, TransportError};
use crate::config::REQUEST_TIMEOUT;

/// Base URL of the live-platform API.
pub const API_BASE: &str = "https://api.live.bilibili.com";

/// Paginated received-gift stream endpoint.
pub const GIFT_STREAM_ENDPOINT: &str =
    "/xlive/revenue/v1/giftStream/getReceivedGiftStreamNextList";

/// Gift type listing endpoint. Not part of the per-day fetch path, but it
/// shares the HTTP stack and makes a cheap session check.
pub const GIFT_TYPES_ENDPOINT: &str = "/gift/v1/master/getGiftTypes";

const ORIGIN_VALUE: &str = "https://link.bilibili.com";
const REFERER_VALUE: &str = "https://link.bilibili.com/p/center/index";
const UA_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Session setup errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A cookie the API requires is absent or empty.
    #[error("missing required cookie: {0}")]
    MissingCookie(&'static str),

    /// A cookie value could not be interpreted.
    #[error("invalid cookie value: {0}")]
    InvalidCookie(String),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// An authenticated platform session derived from browser cookies.
///
/// Requires `SESSDATA` (the auth token) and `DedeUserID` (the numeric user
/// id the cache keys files by).
#[derive(Debug, Clone)]
pub struct Session {
    uid: u64,
    cookie_header: String,
}

impl Session {
    /// Parse a `k=v; k2=v2` cookie string as copied from a browser.
    pub fn from_cookie_str(raw: &str) -> Result<Self, SessionError> {
        let mut sessdata = None;
        let mut uid = None;
        for pair in raw.split(';') {
            let pair = pair.trim();
            if let Some((name, value)) = pair.split_once('=') {
                match name.trim() {
                    "SESSDATA" => sessdata = Some(value.trim().to_string()),
                    "DedeUserID" => uid = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        match sessdata {
            Some(s) if !s.is_empty() => {}
            _ => return Err(SessionError::MissingCookie("SESSDATA")),
        }
        let uid = uid.ok_or(SessionError::MissingCookie("DedeUserID"))?;
        let uid = uid
            .parse::<u64>()
            .map_err(|e| SessionError::InvalidCookie(format!("DedeUserID: {e}")))?;

        Ok(Self {
            uid,
            cookie_header: raw.trim().to_string(),
        })
    }

    /// The streamer's numeric user id.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// The raw cookie header value sent with every request.
    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }
}

/// Production transport over a reqwest client with the session's cookies and
/// a browser-like identity attached to every request.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the given session against the live API.
    pub fn new(session: &Session) -> Result<Self, SessionError> {
        Self::with_base_url(session, API_BASE)
    }

    /// Build a transport against a custom base URL.
    pub fn with_base_url(session: &Session, base_url: &str) -> Result<Self, SessionError> {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(ORIGIN_VALUE));
        headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(UA_VALUE));
        let cookie = HeaderValue::from_str(session.cookie_header())
            .map_err(|e| SessionError::InvalidCookie(e.to_string()))?;
        headers.insert(COOKIE, cookie);

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| SessionError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, params = query.len(), "issuing GET request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(TransportError::from_reqwest)?;

        Ok(ApiResponse { status, body })
    }
}
