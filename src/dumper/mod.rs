//! Range dump orchestration.
//!
//! Iterates a contiguous range of calendar days backward from a start date,
//! serving each day from cache or the network, and hands every completed
//! day to the exporter. The pipeline is deliberately single-flow: one day at
//! a time, one request at a time.

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::cache::{CacheError, CacheKey, DayCache};
use crate::fetcher::client::ApiClient;
use crate::fetcher::pagination::GiftStreamPager;
use crate::fetcher::Transport;
use crate::output::{Exporter, OutputError};
use crate::shutdown::SharedShutdown;
use crate::{CoinMode, DayResult};

/// Dump errors
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// One day failed; the remaining range was aborted. Days already
    /// completed stay cached, so restarting the same range resumes cheaply
    /// from the failed date.
    #[error("failed to dump {date}: {source}")]
    Day {
        /// The date whose fetch failed.
        date: NaiveDate,
        /// The underlying cache or fetch failure.
        #[source]
        source: CacheError,
    },

    /// The requested range walked off the calendar.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Shutdown was requested between days.
    #[error("dump interrupted by shutdown request")]
    Interrupted,

    /// The exporter collaborator failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result type for dump operations
pub type DumpResult<T> = Result<T, DumpError>;

/// Orchestrates the day cache and page walker across a backward date range.
pub struct Dumper<T: Transport> {
    client: ApiClient<T>,
    pager: GiftStreamPager,
    cache: DayCache,
    uid: u64,
    shutdown: Option<SharedShutdown>,
}

impl<T: Transport> Dumper<T> {
    /// Create a dumper with the default pager and no shutdown hook.
    pub fn new(client: ApiClient<T>, cache: DayCache, uid: u64) -> Self {
        Self {
            client,
            pager: GiftStreamPager::default(),
            cache,
            uid,
            shutdown: None,
        }
    }

    /// Replace the default pager (page size, page ceiling).
    pub fn with_pager(mut self, pager: GiftStreamPager) -> Self {
        self.pager = pager;
        self
    }

    /// Attach a shutdown coordinator, checked between days.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Dump one day: serve from cache if allowed, else walk the gift stream
    /// and persist the result.
    pub async fn dump_day(&self, date: NaiveDate, mode: CoinMode) -> DumpResult<DayResult> {
        let key = CacheKey::new(self.uid, date, mode);
        self.cache
            .get_or_fetch(&key, || self.pager.fetch_day(&self.client, date, mode))
            .await
            .map_err(|source| DumpError::Day { date, source })
    }

    /// Dump `n_days` days backward from `start` (start date first), handing
    /// each day's result to `exporter` as it completes.
    ///
    /// Empty days are exported too, explicitly, so the exporter can decide
    /// to skip writing a table. The first failure aborts the remaining
    /// range; completed days stay persisted.
    pub async fn dump_range(
        &self,
        start: NaiveDate,
        n_days: u32,
        mode: CoinMode,
        exporter: &mut dyn Exporter,
    ) -> DumpResult<Vec<DayResult>> {
        let mut results = Vec::with_capacity(n_days as usize);

        for diff in 0..n_days {
            if let Some(shutdown) = &self.shutdown {
                if shutdown.is_shutdown_requested() {
                    info!(completed = results.len(), "range dump interrupted");
                    return Err(DumpError::Interrupted);
                }
            }

            let date = start
                .checked_sub_days(Days::new(u64::from(diff)))
                .ok_or_else(|| {
                    DumpError::InvalidRange(format!("{start} minus {diff} days underflows"))
                })?;

            info!(%date, %mode, "dumping gift stream for day");
            let result = self.dump_day(date, mode).await?;
            exporter.export_day(&result)?;
            results.push(result);
        }

        info!(days = results.len(), "range dump complete");
        Ok(results)
    }

    /// The API client, e.g. for a pre-dump session check.
    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }
}
