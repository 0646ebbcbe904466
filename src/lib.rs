//! # bili-revenue-dump
//!
//! A library for dumping a bilibili live streamer's received-gift revenue
//! history. Walks the paginated `getReceivedGiftStreamNextList` endpoint one
//! calendar day at a time, throttling and retrying requests, and caches each
//! completed day on disk so repeated runs avoid redundant network traffic.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bili_revenue_dump::cache::DayCache;
//! use bili_revenue_dump::fetcher::client::ApiClient;
//! use bili_revenue_dump::fetcher::http::{HttpTransport, Session};
//! use bili_revenue_dump::fetcher::throttle::RequestThrottler;
//! use bili_revenue_dump::dumper::Dumper;
//! use bili_revenue_dump::output::CsvExporter;
//! use bili_revenue_dump::{today_in_reference_tz, CoinMode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::from_cookie_str("DedeUserID=12345; SESSDATA=secret")?;
//! let transport = HttpTransport::new(&session)?;
//! let client = ApiClient::new(transport, RequestThrottler::default(), 5);
//! let cache = DayCache::new("data".into());
//!
//! let dumper = Dumper::new(client, cache, session.uid());
//! let mut exporter = CsvExporter::new("data".into());
//! let results = dumper
//!     .dump_range(today_in_reference_tz(), 7, CoinMode::PaidOnly, &mut exporter)
//!     .await?;
//! println!("dumped {} days", results.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Throttled, retrying API client and the per-day page walker
//! - [`cache`] - On-disk day cache with verbatim raw-JSON persistence
//! - [`dumper`] - Backward date-range orchestration
//! - [`output`] - Exporter boundary and the CSV tabular sink
//! - [`cli`] - CLI command implementations

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// On-disk day cache
pub mod cache;

/// CLI command implementations
pub mod cli;

/// Tuning constants shared across the pipeline
pub mod config;

/// Range dump orchestration
pub mod dumper;

/// Throttled API client and pagination
pub mod fetcher;

/// Exporter boundary and writers
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

pub use cache::CacheKey;
pub use dumper::Dumper;

/// One raw transaction record as returned by the API.
///
/// Entries are treated as opaque, order-preserving field maps: the library
/// never interprets individual fields beyond the `id` used for cursoring.
/// Keeping the map untyped means fields the platform adds later survive a
/// dump-and-reload round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionEntry(pub serde_json::Map<String, Value>);

impl TransactionEntry {
    /// Render the entry's `id` field, used as the pagination cursor.
    ///
    /// The API has returned both numeric and string identifiers over time, so
    /// both are accepted. Returns `None` when the field is absent or has an
    /// unexpected shape.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Which gift coin types a dump covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinMode {
    /// Paid (gold-coin) gifts only.
    PaidOnly,
    /// Paid and free (silver-coin) gifts.
    IncludeFree,
}

impl CoinMode {
    /// Value of the `coin_type` query parameter for this mode.
    pub fn coin_type(self) -> u8 {
        match self {
            CoinMode::PaidOnly => 1,
            CoinMode::IncludeFree => 0,
        }
    }

    /// Suffix embedded in cache and export file names.
    pub fn suffix(self) -> &'static str {
        match self {
            CoinMode::PaidOnly => "",
            CoinMode::IncludeFree => "+free",
        }
    }
}

impl std::fmt::Display for CoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CoinMode::PaidOnly => "paid-only",
            CoinMode::IncludeFree => "include-free",
        };
        write!(f, "{s}")
    }
}

/// Where a day's entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Loaded from a previously persisted file.
    Cache,
    /// Fetched from the network during this run.
    Network,
}

/// The outcome of dumping a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayResult {
    /// The key this result was produced for.
    pub key: CacheKey,
    /// Ordered entries exactly as the API returned them.
    pub entries: Vec<TransactionEntry>,
    /// Whether the entries were served from cache or fetched.
    pub source: Source,
}

/// Fixed UTC+8 offset used by the platform to delimit calendar days.
///
/// "Today" decisions must use this offset, not the caller's local time,
/// otherwise a day could be cached while the platform is still appending
/// records to it.
pub fn reference_tz() -> FixedOffset {
    // SAFETY: 8 * 3600 is within the valid offset range.
    FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset")
}

/// The current calendar day in the platform's reference timezone.
pub fn today_in_reference_tz() -> NaiveDate {
    Utc::now().with_timezone(&reference_tz()).date_naive()
}

/// Whether `date` is the current calendar day in the reference timezone.
pub fn is_today(date: NaiveDate) -> bool {
    date == today_in_reference_tz()
}
