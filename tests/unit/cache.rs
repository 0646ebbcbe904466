//! Unit tests for the day cache: reuse policy, today semantics, and the
//! persisted raw format.

use bili_revenue_dump::cache::{CacheKey, DayCache};
use bili_revenue_dump::{today_in_reference_tz, CoinMode, Source, TransactionEntry};
use chrono::NaiveDate;
use serde_json::json;
use std::cell::Cell;

fn entries(ids: &[u64]) -> Vec<TransactionEntry> {
    ids.iter()
        .map(|id| {
            serde_json::from_value(json!({"id": id, "gift_name": "小花花", "gold": 100})).unwrap()
        })
        .collect()
}

fn past_key() -> CacheKey {
    CacheKey::new(
        674413,
        NaiveDate::from_ymd_opt(2023, 10, 24).unwrap(),
        CoinMode::PaidOnly,
    )
}

/// Run get_or_fetch with a counting fetcher that yields `fetched`.
async fn get_counted(
    cache: &DayCache,
    key: &CacheKey,
    fetched: Vec<TransactionEntry>,
    calls: &Cell<u32>,
) -> bili_revenue_dump::DayResult {
    cache
        .get_or_fetch(key, || {
            calls.set(calls.get() + 1);
            let fetched = fetched.clone();
            async move { Ok(fetched) }
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_cache_idempotence_for_past_day() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DayCache::new(dir.path().to_path_buf());
    let key = past_key();
    let calls = Cell::new(0);

    let first = get_counted(&cache, &key, entries(&[1, 2, 3]), &calls).await;
    assert_eq!(first.source, Source::Network);
    assert_eq!(calls.get(), 1);
    let bytes_after_first = std::fs::read(cache.entry_path(&key)).unwrap();

    let second = get_counted(&cache, &key, entries(&[9, 9, 9]), &calls).await;
    assert_eq!(second.source, Source::Cache);
    assert_eq!(calls.get(), 1, "second lookup must not fetch");
    assert_eq!(second.entries, first.entries);
    assert_eq!(std::fs::read(cache.entry_path(&key)).unwrap(), bytes_after_first);
}

#[tokio::test]
async fn test_today_is_never_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DayCache::new(dir.path().to_path_buf());
    let key = CacheKey::new(674413, today_in_reference_tz(), CoinMode::PaidOnly);
    let calls = Cell::new(0);

    let first = get_counted(&cache, &key, entries(&[1]), &calls).await;
    assert_eq!(first.source, Source::Network);
    // The partial file exists, yet the second call still fetches.
    assert!(cache.entry_path(&key).exists());
    let second = get_counted(&cache, &key, entries(&[1, 2]), &calls).await;
    assert_eq!(second.source, Source::Network);
    assert_eq!(calls.get(), 2);
    assert_eq!(second.entries.len(), 2);
}

#[tokio::test]
async fn test_empty_day_is_persisted_and_replayed() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DayCache::new(dir.path().to_path_buf());
    let key = past_key();
    let calls = Cell::new(0);

    let first = get_counted(&cache, &key, entries(&[]), &calls).await;
    assert_eq!(first.source, Source::Network);
    assert!(first.entries.is_empty());
    assert_eq!(
        std::fs::read_to_string(cache.entry_path(&key)).unwrap(),
        "[\n\n]"
    );

    let second = get_counted(&cache, &key, entries(&[5]), &calls).await;
    assert_eq!(second.source, Source::Cache);
    assert!(second.entries.is_empty());
    assert_eq!(calls.get(), 1, "empty day must not be re-fetched");
}

#[tokio::test]
async fn test_raw_format_is_one_compact_entry_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DayCache::new(dir.path().to_path_buf());
    let key = past_key();
    let calls = Cell::new(0);

    get_counted(&cache, &key, entries(&[1, 2]), &calls).await;

    let raw = std::fs::read_to_string(cache.entry_path(&key)).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "[");
    assert_eq!(lines[1], r#"{"id":1,"gift_name":"小花花","gold":100},"#);
    assert_eq!(lines[2], r#"{"id":2,"gift_name":"小花花","gold":100}"#);
    assert_eq!(lines[3], "]");
}

#[tokio::test]
async fn test_corrupt_cache_file_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DayCache::new(dir.path().to_path_buf());
    let key = past_key();
    let calls = Cell::new(0);

    let path = cache.entry_path(&key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not an entry array").unwrap();

    let result = get_counted(&cache, &key, entries(&[7]), &calls).await;
    assert_eq!(result.source, Source::Network);
    assert_eq!(calls.get(), 1);
    // File was rewritten and now parses again.
    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<TransactionEntry> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_propagates_and_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DayCache::new(dir.path().to_path_buf());
    let key = past_key();

    let err = cache
        .get_or_fetch(&key, || async {
            Err(bili_revenue_dump::fetcher::FetcherError::Protocol(
                "boom".to_string(),
            ))
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        bili_revenue_dump::cache::CacheError::Fetch(_)
    ));
    assert!(!cache.entry_path(&key).exists());
}
