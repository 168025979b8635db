//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::document::Document;
use crate::error::FetchError;
use crate::fetch::Fetcher;

/// Fetcher that replays a fixed sequence of responses.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Value, FetchError>>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<Value, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requested: Mutex::new(Vec::new()),
        })
    }

    /// Endpoints fetched so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Document, FetchError> {
        self.requested.lock().push(endpoint.to_string());
        match self.responses.lock().pop_front() {
            Some(response) => response.map(Document::from),
            None => Err(FetchError::request(endpoint, "no scripted response left")),
        }
    }
}

/// Fetcher that holds each fetch open for `delay` and records how many
/// fetches were in flight at the same time.
#[derive(Debug)]
pub struct SlowFetcher {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowFetcher {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    /// Highest number of concurrent fetches observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for SlowFetcher {
    async fn fetch(&self, _endpoint: &str) -> Result<Document, FetchError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Document::from(serde_json::json!({"object_totals": {"queues": current}})))
    }
}
