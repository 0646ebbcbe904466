//! Cursor walk over the paginated gift stream.
//!
//! One invocation collects every record for a single (date, mode) pair by
//! advancing the `last_id` cursor until the endpoint reports completion.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::client::ApiClient;
use super::http::GIFT_STREAM_ENDPOINT;
use super::{FetcherError, FetcherResult, Transport};
use crate::config::{MAX_PAGES, PAGE_LIMIT};
use crate::{CoinMode, TransactionEntry};

/// One page of the gift stream response.
#[derive(Debug, Deserialize)]
struct GiftStreamPage {
    #[serde(default)]
    list: Vec<TransactionEntry>,
    #[serde(default)]
    has_more: bool,
}

/// Walks the gift stream for one calendar day.
#[derive(Debug, Clone)]
pub struct GiftStreamPager {
    page_limit: u32,
    max_pages: u32,
}

impl GiftStreamPager {
    /// Create a pager with explicit page size and page-count ceiling.
    pub fn new(page_limit: u32, max_pages: u32) -> Self {
        Self {
            page_limit,
            max_pages,
        }
    }

    /// Fetch every entry for `date`, in the order the API returns them.
    ///
    /// Pages are requested with `begin_time` at day granularity and the
    /// cursor set to the id of the last entry of the previous page. The walk
    /// stops on an empty page or `has_more = false`. The API's order is
    /// authoritative: no re-sorting, no dedup.
    ///
    /// # Errors
    ///
    /// Propagates any [`ApiClient::call`] failure, and fails with
    /// [`FetcherError::Protocol`] if the endpoint never signals completion
    /// within the page ceiling, or a non-terminal page lacks a usable cursor.
    pub async fn fetch_day<T: Transport>(
        &self,
        client: &ApiClient<T>,
        date: NaiveDate,
        mode: CoinMode,
    ) -> FetcherResult<Vec<TransactionEntry>> {
        let begin_time = date.format("%Y-%m-%d").to_string();
        let mut entries = Vec::new();
        let mut last_id: Option<String> = None;

        for page_no in 0.. {
            if page_no >= self.max_pages {
                return Err(FetcherError::Protocol(format!(
                    "exceeded {} pages for {begin_time} without a completion signal",
                    self.max_pages
                )));
            }

            let mut query = vec![
                ("limit".to_string(), self.page_limit.to_string()),
                ("coin_type".to_string(), mode.coin_type().to_string()),
                ("gift_id".to_string(), String::new()),
                ("begin_time".to_string(), begin_time.clone()),
                ("uname".to_string(), String::new()),
            ];
            if let Some(id) = &last_id {
                query.push(("last_id".to_string(), id.clone()));
            }

            debug!(page = page_no, %begin_time, %mode, "fetching gift stream page");
            let data = client.call(GIFT_STREAM_ENDPOINT, &query).await?;
            let page: GiftStreamPage =
                serde_json::from_value(data).map_err(FetcherError::Decode)?;

            debug!(
                page = page_no,
                received = page.list.len(),
                has_more = page.has_more,
                "received gift stream page"
            );

            let done = page.list.is_empty() || !page.has_more;
            if !done {
                // SAFETY: the list is non-empty when `done` is false.
                let cursor = page.list.last().expect("non-empty page").id();
                last_id = Some(cursor.ok_or_else(|| {
                    FetcherError::Protocol(format!(
                        "page {page_no} for {begin_time} has more data but its \
                         last entry carries no id to cursor from"
                    ))
                })?);
            }

            entries.extend(page.list);
            if done {
                break;
            }
        }

        debug!(%begin_time, total = entries.len(), "gift stream walk complete");
        Ok(entries)
    }
}

impl Default for GiftStreamPager {
    fn default() -> Self {
        Self::new(PAGE_LIMIT, MAX_PAGES)
    }
}
