//! On-disk day cache.
//!
//! One file per (uid, date, mode) key under `<root>/raw/`, holding the exact
//! ordered JSON array of raw entries as received, one entry per line so the
//! files stay human-diffable. A day equal to "today" in the platform's
//! reference timezone is never served from cache: its data is still
//! accumulating, so a snapshot would be stale. Such days are still written
//! (with a `-partial` name suffix) for audit, but never read back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::fetcher::FetcherError;
use crate::{is_today, CoinMode, DayResult, Source, TransactionEntry};

/// Subdirectory for raw per-day JSON files.
const RAW_DIR: &str = "raw";

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Filesystem fault while reading or writing a cache file.
    #[error("cache I/O error: {0}")]
    Io(String),

    /// A persisted file no longer parses as a JSON entry array.
    #[error("corrupt cache file {path}: {detail}")]
    Corrupt {
        /// Path of the offending file.
        path: String,
        /// Parse failure detail.
        detail: String,
    },

    /// The fall-through network fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetcherError),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Uniquely addresses one persisted record set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Streamer's numeric user id.
    pub uid: u64,
    /// Calendar day in the platform's reference timezone.
    pub date: NaiveDate,
    /// Coin mode the record set was fetched with.
    pub mode: CoinMode,
}

impl CacheKey {
    /// Create a key.
    pub fn new(uid: u64, date: NaiveDate, mode: CoinMode) -> Self {
        Self { uid, date, mode }
    }

    /// Whether this key addresses a still-accumulating day.
    pub fn is_partial(&self) -> bool {
        is_today(self.date)
    }

    /// The storage name for this key, without extension:
    /// `{uid}-{YYYYMMDD}{mode_suffix}{-partial if today}`.
    ///
    /// Keeping the key-to-name mapping in one place isolates the persisted
    /// format from the reuse decision.
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}{}{}",
            self.uid,
            self.date.format("%Y%m%d"),
            self.mode.suffix(),
            if self.is_partial() { "-partial" } else { "" },
        )
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// Decides per-day whether a persisted record set may be reused, and
/// persists newly fetched sets.
#[derive(Debug, Clone)]
pub struct DayCache {
    root: PathBuf,
}

impl DayCache {
    /// Create a cache rooted at `root` (raw files land in `<root>/raw/`).
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Path of the raw file for `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(RAW_DIR)
            .join(format!("{}.json", key.file_stem()))
    }

    /// Return the cached record set for `key`, or invoke `fetch` and persist
    /// what it returns.
    ///
    /// Policy, in order:
    /// 1. `key.date` is today (reference timezone): always fetch fresh.
    /// 2. A persisted file exists: load it, zero network calls.
    /// 3. Fetch, persist verbatim (an empty set is persisted too, recording
    ///    "no transactions that day"), return.
    ///
    /// A corrupt persisted file is logged and treated as absent rather than
    /// fatal: the day is re-fetched and the file rewritten.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> CacheResult<DayResult>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<TransactionEntry>, FetcherError>>,
    {
        let path = self.entry_path(key);

        if !key.is_partial() && path.exists() {
            match self.load(&path) {
                Ok(entries) => {
                    info!(key = %key.file_stem(), count = entries.len(), "loaded from cache");
                    return Ok(DayResult {
                        key: key.clone(),
                        entries,
                        source: Source::Cache,
                    });
                }
                Err(err @ CacheError::Corrupt { .. }) => {
                    warn!(key = %key.file_stem(), %err, "corrupt cache file, re-fetching");
                }
                Err(err) => return Err(err),
            }
        }

        let entries = fetch().await?;
        self.store(&path, &entries)?;
        info!(key = %key.file_stem(), count = entries.len(), "entries fetched and persisted");

        Ok(DayResult {
            key: key.clone(),
            entries,
            source: Source::Network,
        })
    }

    /// Load a persisted entry array.
    fn load(&self, path: &Path) -> CacheResult<Vec<TransactionEntry>> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CacheError::Io(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| CacheError::Corrupt {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Persist an entry array verbatim: a JSON array with one compact entry
    /// per line, non-ASCII left unescaped. Written atomically via a temp
    /// file in the same directory.
    fn store(&self, path: &Path, entries: &[TransactionEntry]) -> CacheResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| CacheError::Io(format!("{} has no parent", path.display())))?;
        std::fs::create_dir_all(parent)
            .map_err(|e| CacheError::Io(format!("failed to create {}: {e}", parent.display())))?;

        let lines = entries
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CacheError::Io(format!("failed to serialize entries: {e}")))?;
        let body = format!("[\n{}\n]", lines.join(",\n"));

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| CacheError::Io(format!("failed to create temp file: {e}")))?;
        tmp.write_all(body.as_bytes())
            .map_err(|e| CacheError::Io(format!("failed to write temp file: {e}")))?;
        tmp.persist(path)
            .map_err(|e| CacheError::Io(format!("failed to persist {}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = body.len(), "raw entries written");
        Ok(())
    }
}
