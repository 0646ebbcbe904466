//! Pipeline tuning constants

use std::time::Duration;

/// Minimum gap between outbound API calls.
/// The revenue endpoint tolerates roughly one request every two seconds from
/// a browser session; going faster risks the session being flagged.
pub const SLEEP_INTERVAL: Duration = Duration::from_secs(2);

/// Total request attempts per API call (first try included).
/// 5 attempts recovers from transient disconnects and timeouts while the
/// throttler keeps retries spaced out; persistent faults fail in ~10s.
pub const MAX_RETRIES: u32 = 5;

/// Total HTTP request timeout, matching the platform's observed worst-case
/// response time for deep gift-stream pages.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Page size for the gift stream endpoint. The endpoint caps pages at 20
/// entries regardless of the requested limit.
pub const PAGE_LIMIT: u32 = 20;

/// Defensive ceiling on pages walked for a single day.
/// The endpoint signals completion via `has_more`; if it never does (API
/// change, misbehavior), the walk aborts with a protocol error instead of
/// looping forever. 1000 pages is 20k entries, far beyond any real day.
pub const MAX_PAGES: u32 = 1000;
