//! Block-based unique ID allocation.
//!
//! Each [`BlockAllocator`] reserves a contiguous range of IDs from a shared
//! [`SequenceStore`] with a single atomic increment and then hands IDs out
//! locally. Allocators in different processes never overlap because every
//! reservation moves the shared counter forward by a full block.
//!
//! IDs of a block abandoned on shutdown or crash are skipped for good.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::repositories::SequenceStore;
use crate::error::AppError;
use crate::utils::deadline::with_deadline;

/// IDs reserved per round trip to the sequence store.
pub const DEFAULT_BLOCK_SIZE: u64 = 1000;

/// Key of the shared counter.
pub const DEFAULT_SEQUENCE_KEY: &str = "next_id_seq";

/// A reserved ID range.
///
/// IDs handed out from the block are `min_id + 1 ..= max_id`. The block is
/// exhausted once `current_id == max_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdBlock {
    pub min_id: u64,
    pub max_id: u64,
    pub current_id: u64,
}

impl IdBlock {
    pub fn is_exhausted(&self) -> bool {
        self.current_id >= self.max_id
    }

    fn take(&mut self) -> u64 {
        self.current_id += 1;
        self.current_id
    }
}

/// In-process ID source backed by a shared counter.
///
/// The check/reserve/increment sequence runs under one async mutex, so
/// concurrent callers in the same process serialize. The only await while
/// the lock is held is the reservation call.
pub struct BlockAllocator {
    store: Arc<dyn SequenceStore>,
    key: String,
    block_size: u64,
    timeout: Duration,
    block: Mutex<IdBlock>,
}

impl BlockAllocator {
    /// Creates an allocator with no reserved block; the first call to
    /// [`Self::next_id`] reserves one.
    ///
    /// A `block_size` of zero is treated as one.
    pub fn new(
        store: Arc<dyn SequenceStore>,
        key: impl Into<String>,
        block_size: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            block_size: block_size.max(1),
            timeout,
            block: Mutex::new(IdBlock::default()),
        }
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Returns the next ID.
    ///
    /// IDs from one allocator are strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Allocation`] if a block is needed and the store
    /// fails, or [`AppError::Timeout`] if the reservation exceeds its
    /// deadline. The local block is left untouched in both cases. No retry is
    /// attempted.
    pub async fn next_id(&self) -> Result<u64, AppError> {
        let mut block = self.block.lock().await;

        if block.is_exhausted() {
            *block = self.reserve().await?;
        }

        Ok(block.take())
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    /// Snapshot of the block currently held.
    pub async fn current_block(&self) -> IdBlock {
        *self.block.lock().await
    }

    async fn reserve(&self) -> Result<IdBlock, AppError> {
        let end = with_deadline(
            self.timeout,
            "ID block reservation",
            self.store.increment_by(&self.key, self.block_size),
        )
        .await
        .map_err(|e| match e {
            AppError::Timeout { .. } | AppError::Allocation { .. } => e,
            other => AppError::allocation(
                "Failed to reserve ID block",
                json!({ "reason": other.to_string() }),
            ),
        })?;

        let min_id = end.checked_sub(self.block_size).ok_or_else(|| {
            AppError::allocation(
                "Sequence counter is smaller than the block size",
                json!({ "key": self.key, "value": end, "block_size": self.block_size }),
            )
        })?;

        metrics::counter!("id_blocks_reserved_total").increment(1);
        info!("Reserved ID block {}..={}", min_id + 1, end);
        debug!("Sequence key {} now at {}", self.key, end);

        Ok(IdBlock {
            min_id,
            max_id: end,
            current_id: min_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockSequenceStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Shared counter that records how often it was incremented.
    #[derive(Default)]
    struct CountingSequence {
        value: AtomicU64,
        calls: AtomicUsize,
    }

    impl CountingSequence {
        fn starting_at(value: u64) -> Self {
            Self {
                value: AtomicU64::new(value),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SequenceStore for CountingSequence {
        async fn increment_by(&self, _key: &str, delta: u64) -> Result<u64, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value.fetch_add(delta, Ordering::SeqCst) + delta)
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct SlowSequence;

    #[async_trait]
    impl SequenceStore for SlowSequence {
        async fn increment_by(&self, _key: &str, delta: u64) -> Result<u64, AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(delta)
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn allocator(store: Arc<dyn SequenceStore>, block_size: u64) -> BlockAllocator {
        BlockAllocator::new(store, DEFAULT_SEQUENCE_KEY, block_size, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_first_call_reserves_block() {
        let store = Arc::new(CountingSequence::default());
        let allocator = allocator(store.clone(), 1000);

        assert_eq!(allocator.next_id().await.unwrap(), 1);
        assert_eq!(store.calls(), 1);
        assert_eq!(
            allocator.current_block().await,
            IdBlock {
                min_id: 0,
                max_id: 1000,
                current_id: 1
            }
        );
    }

    #[tokio::test]
    async fn test_ids_within_block_skip_the_store() {
        let store = Arc::new(CountingSequence::default());
        let allocator = allocator(store.clone(), 10);

        let ids: Vec<u64> = {
            let mut ids = Vec::new();
            for _ in 0..10 {
                ids.push(allocator.next_id().await.unwrap());
            }
            ids
        };

        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        assert_eq!(store.calls(), 1);
        assert!(allocator.current_block().await.is_exhausted());
    }

    #[tokio::test]
    async fn test_rollover_reserves_exactly_once() {
        let store = Arc::new(CountingSequence::default());
        let allocator = allocator(store.clone(), 10);

        for _ in 0..10 {
            allocator.next_id().await.unwrap();
        }
        assert_eq!(store.calls(), 1);

        assert_eq!(allocator.next_id().await.unwrap(), 11);
        assert_eq!(store.calls(), 2);

        for _ in 0..9 {
            allocator.next_id().await.unwrap();
        }
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_resumes_from_existing_counter() {
        let store = Arc::new(CountingSequence::starting_at(5000));
        let allocator = allocator(store, 1000);

        assert_eq!(allocator.next_id().await.unwrap(), 5001);
        assert_eq!(allocator.current_block().await.max_id, 6000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_get_distinct_gap_free_ids() {
        let store = Arc::new(CountingSequence::default());
        let allocator = Arc::new(allocator(store.clone(), 1000));

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let allocator = allocator.clone();
                tokio::spawn(async move { allocator.next_id().await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_allocators_sharing_a_counter_are_disjoint() {
        let store = Arc::new(CountingSequence::default());
        let first = Arc::new(allocator(store.clone(), 7));
        let second = Arc::new(allocator(store.clone(), 7));

        let mut handles = Vec::new();
        for i in 0..100 {
            let allocator = if i % 2 == 0 {
                first.clone()
            } else {
                second.clone()
            };
            handles.push(tokio::spawn(async move {
                (i % 2, allocator.next_id().await.unwrap())
            }));
        }

        let mut from_first = HashSet::new();
        let mut from_second = HashSet::new();
        for handle in handles {
            let (owner, id) = handle.await.unwrap();
            if owner == 0 {
                assert!(from_first.insert(id));
            } else {
                assert!(from_second.insert(id));
            }
        }

        assert_eq!(from_first.len(), 50);
        assert_eq!(from_second.len(), 50);
        assert!(from_first.is_disjoint(&from_second));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_allocation_error() {
        let mut store = MockSequenceStore::new();
        let mut first_call = true;
        store.expect_increment_by().times(2).returning(move |_, delta| {
            if std::mem::take(&mut first_call) {
                Err(AppError::internal("connection refused", json!({})))
            } else {
                Ok(delta)
            }
        });

        let allocator = allocator(Arc::new(store), 5);

        let err = allocator.next_id().await.unwrap_err();
        assert!(matches!(err, AppError::Allocation { .. }));
        assert_eq!(allocator.current_block().await, IdBlock::default());

        // No internal retry: the next call is a fresh reservation.
        assert_eq!(allocator.next_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_below_block_size_is_rejected() {
        let mut store = MockSequenceStore::new();
        store.expect_increment_by().returning(|_, _| Ok(3));

        let allocator = allocator(Arc::new(store), 10);

        assert!(matches!(
            allocator.next_id().await.unwrap_err(),
            AppError::Allocation { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reservation_timeout_leaves_block_unchanged() {
        let allocator = allocator(Arc::new(SlowSequence), 10);

        let err = allocator.next_id().await.unwrap_err();

        assert!(matches!(err, AppError::Timeout { .. }));
        assert!(allocator.current_block().await.is_exhausted());
    }

    #[tokio::test]
    async fn test_zero_block_size_is_clamped() {
        let store = Arc::new(CountingSequence::default());
        let allocator = allocator(store.clone(), 0);

        assert_eq!(allocator.block_size(), 1);
        assert_eq!(allocator.next_id().await.unwrap(), 1);
        assert_eq!(allocator.next_id().await.unwrap(), 2);
        assert_eq!(store.calls(), 2);
    }
}
