#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use nanolink::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "http://nano.test";
pub const CACHE_TTL: Duration = Duration::from_secs(3600);
pub const STORE_TIMEOUT: Duration = Duration::from_secs(1);

/// Link store that counts lookups.
#[derive(Default)]
pub struct MemoryLinks {
    links: Mutex<HashMap<String, Link>>,
    finds: AtomicUsize,
}

impl MemoryLinks {
    pub fn find_calls(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinks {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.lock().unwrap();
        if links.contains_key(&new_link.code) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                serde_json::json!({}),
            ));
        }

        let link = Link::new(new_link.id, new_link.code, new_link.long_url, Utc::now());
        links.insert(link.code.clone(), link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self.links.lock().unwrap().get(code).cloned())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Cache whose entries expire only when a test says so.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl MemoryCache {
    pub fn get(&self, code: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(code)
            .map(|(url, _)| url.clone())
    }

    pub fn ttl_of(&self, code: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(code).map(|(_, ttl)| *ttl)
    }

    /// Simulates the entry's TTL running out.
    pub fn expire(&self, code: &str) {
        self.entries.lock().unwrap().remove(code);
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        Ok(self.get(short_code))
    }

    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(short_code.to_string(), (long_url.to_string(), ttl));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct MemorySequence {
    value: AtomicU64,
    down: AtomicBool,
}

impl MemorySequence {
    pub fn set_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SequenceStore for MemorySequence {
    async fn increment_by(&self, _key: &str, delta: u64) -> Result<u64, AppError> {
        Ok(self.value.fetch_add(delta, Ordering::SeqCst) + delta)
    }

    async fn health_check(&self) -> bool {
        !self.down.load(Ordering::SeqCst)
    }
}

/// Append-only in-memory stream, usable as both producer and connector.
#[derive(Default)]
pub struct MemoryStream {
    shards: Mutex<HashMap<String, Vec<String>>>,
    committed: Mutex<Vec<String>>,
}

impl MemoryStream {
    pub fn entries(&self, shard: &str) -> Vec<String> {
        self.shards
            .lock()
            .unwrap()
            .get(shard)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.shards.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn committed(&self) -> Vec<String> {
        self.committed.lock().unwrap().clone()
    }

    /// Waits until at least `count` entries were published.
    pub async fn wait_for_entries(&self, count: usize) {
        for _ in 0..200 {
            if self.total() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {count} stream entries, found {}", self.total());
    }
}

#[async_trait]
impl ClickPublisher for MemoryStream {
    async fn publish(&self, shard: &str, payload: String) -> Result<(), AppError> {
        self.shards
            .lock()
            .unwrap()
            .entry(shard.to_string())
            .or_default()
            .push(payload);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Connector handing out readers over a shared [`MemoryStream`].
pub struct MemoryConnector(pub Arc<MemoryStream>);

#[async_trait]
impl ClickStreamConnector for MemoryConnector {
    async fn subscribe(&self, shard: &str) -> Result<Box<dyn ClickSubscription>, AppError> {
        Ok(Box::new(MemorySubscription {
            stream: self.0.clone(),
            shard: shard.to_string(),
            offset: 0,
        }))
    }
}

struct MemorySubscription {
    stream: Arc<MemoryStream>,
    shard: String,
    offset: usize,
}

#[async_trait]
impl ClickSubscription for MemorySubscription {
    async fn next_batch(&mut self) -> Result<Vec<StreamMessage>, AppError> {
        let entries = self.stream.entries(&self.shard);
        if entries.len() <= self.offset {
            tokio::time::sleep(Duration::from_millis(5)).await;
            return Ok(Vec::new());
        }

        let batch = entries[self.offset..]
            .iter()
            .enumerate()
            .map(|(i, payload)| StreamMessage {
                id: format!("{}-0", self.offset + i),
                payload: payload.clone(),
            })
            .collect();
        self.offset = entries.len();
        Ok(batch)
    }

    async fn commit(&mut self, id: &str) -> Result<(), AppError> {
        self.stream.committed.lock().unwrap().push(id.to_string());
        Ok(())
    }

    fn rewind(&mut self) {
        let committed = self.stream.committed();
        self.offset = (0..self.offset)
            .find(|i| !committed.contains(&format!("{i}-0")))
            .unwrap_or(self.offset);
    }
}

#[derive(Default)]
pub struct MemoryCounters {
    counters: Mutex<HashMap<String, ClickCounter>>,
}

impl MemoryCounters {
    pub fn count(&self, code: &str) -> i64 {
        self.counters
            .lock()
            .unwrap()
            .get(code)
            .map(|c| c.click_count)
            .unwrap_or(0)
    }

    /// Waits until `code` has at least `count` clicks.
    pub async fn wait_for_count(&self, code: &str, count: i64) {
        for _ in 0..200 {
            if self.count(code) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "expected {count} clicks for {code}, found {}",
            self.count(code)
        );
    }
}

#[async_trait]
impl ClickCounterRepository for MemoryCounters {
    async fn record_click(&self, code: &str, clicked_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut counters = self.counters.lock().unwrap();
        let counter = counters
            .entry(code.to_string())
            .or_insert_with(|| ClickCounter::new(code.to_string(), 0, clicked_at));
        counter.click_count += 1;
        counter.last_clicked_at = clicked_at;
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ClickCounter>, AppError> {
        Ok(self.counters.lock().unwrap().get(code).cloned())
    }
}

/// Full pipeline wired to in-memory backends.
pub struct TestApp {
    pub state: AppState,
    pub links: Arc<MemoryLinks>,
    pub cache: Arc<MemoryCache>,
    pub sequence: Arc<MemorySequence>,
    pub stream: Arc<MemoryStream>,
    pub counters: Arc<MemoryCounters>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_emitter(true)
    }

    /// `emit = false` builds a server whose click emission is disabled.
    pub fn with_emitter(emit: bool) -> Self {
        let links = Arc::new(MemoryLinks::default());
        let cache = Arc::new(MemoryCache::default());
        let stream = Arc::new(MemoryStream::default());
        let counters = Arc::new(MemoryCounters::default());
        let sequence = Arc::new(MemorySequence::default());

        let allocator = Arc::new(BlockAllocator::new(
            sequence.clone(),
            "next_id_seq",
            100,
            STORE_TIMEOUT,
        ));

        let link_service = Arc::new(LinkService::new(
            allocator,
            links.clone(),
            cache.clone(),
            CACHE_TTL,
            STORE_TIMEOUT,
        ));
        let stats_service = Arc::new(StatsService::new(counters.clone(), STORE_TIMEOUT));

        let emitter = if emit {
            ClickEmitter::new(stream.clone(), "clicks", 1)
        } else {
            ClickEmitter::disabled()
        };

        let state = AppState::new(
            link_service,
            stats_service,
            emitter,
            cache.clone(),
            links.clone(),
            BASE_URL,
        );

        Self {
            state,
            links,
            cache,
            sequence,
            stream,
            counters,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(nanolink::routes::router(self.state.clone())).unwrap()
    }

    pub fn aggregator(&self) -> Arc<ClickAggregator> {
        Arc::new(ClickAggregator::new(
            Arc::new(MemoryConnector(self.stream.clone())),
            self.counters.clone(),
            RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_millis(1),
            },
            STORE_TIMEOUT,
        ))
    }
}
