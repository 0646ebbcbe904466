//! Shared test helpers: a scripted transport and a recording exporter.

#![allow(dead_code)]

use async_trait::async_trait;
use bili_revenue_dump::fetcher::{ApiResponse, Transport, TransportError};
use bili_revenue_dump::output::{Exporter, OutputResult};
use bili_revenue_dump::{DayResult, Source};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// One scripted transport outcome.
pub enum MockReply {
    /// A 200 response with the given JSON body.
    Body(Value),
    /// A response with an explicit HTTP status.
    BodyWithStatus(u16, Value),
    /// A transport-level fault.
    Fault(TransportError),
}

/// A recorded call with its query and start instant.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub at: Instant,
}

impl RecordedCall {
    pub fn query_get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct MockInner {
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// Transport that replays a fixed script of replies and records every call.
/// Clones share the same script and call log.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new(script: Vec<MockReply>) -> Self {
        Self {
            inner: Arc::new(MockInner {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, TransportError> {
        self.inner.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            query: query.to_vec(),
            at: Instant::now(),
        });

        let reply = self.inner.script.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Body(body)) => Ok(ApiResponse { status: 200, body }),
            Some(MockReply::BodyWithStatus(status, body)) => Ok(ApiResponse { status, body }),
            Some(MockReply::Fault(fault)) => Err(fault),
            None => Err(TransportError::Other("mock script exhausted".to_string())),
        }
    }
}

/// A plausible raw gift entry with the given id.
pub fn gift_entry(id: u64) -> Value {
    json!({
        "id": id,
        "uid": 1472906636,
        "uname": "观众甲",
        "time": "2023-10-24 21:13:37",
        "gift_id": 31036,
        "gift_name": "小花花",
        "gold": 100,
        "silver": 0,
        "coin_type": "gold",
        "hamster": 10
    })
}

/// A successful gift-stream page reply.
pub fn page_reply(ids: &[u64], has_more: bool) -> MockReply {
    let list: Vec<Value> = ids.iter().map(|id| gift_entry(*id)).collect();
    MockReply::Body(json!({
        "code": 0,
        "message": "0",
        "data": { "list": list, "has_more": has_more }
    }))
}

/// An application-level rejection reply.
pub fn api_error_reply(code: i64, message: &str) -> MockReply {
    MockReply::Body(json!({ "code": code, "message": message }))
}

/// A transient timeout fault.
pub fn transient_fault() -> MockReply {
    MockReply::Fault(TransportError::Timeout("simulated timeout".to_string()))
}

/// Exporter that records what it was handed.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    pub days: Vec<(NaiveDate, usize, Source)>,
}

impl Exporter for RecordingExporter {
    fn export_day(&mut self, result: &DayResult) -> OutputResult<()> {
        self.days
            .push((result.key.date, result.entries.len(), result.source));
        Ok(())
    }
}
