//! Click aggregation worker.
//!
//! Consumes click events from the stream and folds them into per-code
//! counters. One consumer loop runs per shard; within a shard events are
//! applied in order.
//!
//! # Connection Lifecycle
//!
//! ```text
//! Connecting --subscribe ok--> Subscribed --> Consuming
//!     ^                                          |
//!     +--------------- connection lost ----------+
//! ```
//!
//! Connecting retries with a fixed backoff. When every attempt fails the
//! shard loop returns [`AppError::StreamUnavailable`], which the worker
//! binary treats as fatal: a crash is visible, a stalled consumer is not.
//!
//! A failed counter write stops the batch at that entry. The subscription is
//! rewound and the uncommitted entries are retried after the same backoff,
//! with the connection kept open. Consecutive write failures are bounded by
//! the same [`RetryPolicy`]; the last error is returned once it is exhausted.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::DateTime;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{ClickCounterRepository, ClickStreamConnector, ClickSubscription};
use crate::error::AppError;
use crate::utils::deadline::with_deadline;

/// Where a shard consumer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Connecting,
    Subscribed,
    Consuming,
}

/// Bounded reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connection attempts, including the first.
    pub max_attempts: usize,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Result of applying one batch.
enum BatchOutcome {
    Applied,
    /// A counter write failed; entries from this one on are uncommitted.
    StoreFailed(AppError),
}

/// Applies click events to analytics storage.
pub struct ClickAggregator {
    connector: Arc<dyn ClickStreamConnector>,
    counters: Arc<dyn ClickCounterRepository>,
    retry: RetryPolicy,
    store_timeout: Duration,
}

impl ClickAggregator {
    pub fn new(
        connector: Arc<dyn ClickStreamConnector>,
        counters: Arc<dyn ClickCounterRepository>,
        retry: RetryPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            counters,
            retry,
            store_timeout,
        }
    }

    /// Parses one stream payload and records the click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for payloads that are not a valid
    /// click event; these should be skipped. Storage failures are returned
    /// as-is.
    pub async fn apply_payload(&self, payload: &str) -> Result<ClickEvent, AppError> {
        let event = ClickEvent::from_payload(payload).map_err(|e| {
            AppError::bad_request(
                "Malformed click event",
                json!({ "reason": e.to_string() }),
            )
        })?;

        let clicked_at = DateTime::from_timestamp(event.timestamp, 0).ok_or_else(|| {
            AppError::bad_request(
                "Click timestamp out of range",
                json!({ "timestamp": event.timestamp }),
            )
        })?;

        with_deadline(
            self.store_timeout,
            "click counter upsert",
            self.counters.record_click(&event.short_code, clicked_at),
        )
        .await?;

        metrics::counter!("click_events_aggregated_total").increment(1);
        Ok(event)
    }

    /// Runs one consumer loop per shard until shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first fatal shard error; remaining shard loops are
    /// aborted.
    pub async fn run(
        self: Arc<Self>,
        shards: Vec<String>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), AppError> {
        let mut tasks = JoinSet::new();
        for shard in shards {
            let aggregator = self.clone();
            let shutdown = shutdown.clone();
            tasks.spawn(async move { aggregator.run_shard(shard, shutdown).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(AppError::internal(
                        "Shard consumer panicked",
                        json!({ "reason": e.to_string() }),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Consumes `shard` until shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StreamUnavailable`] once reconnecting has
    /// exhausted the retry policy.
    pub async fn run_shard(
        &self,
        shard: String,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), AppError> {
        let mut state = AggregatorState::Connecting;
        let mut subscription: Option<Box<dyn ClickSubscription>> = None;
        let mut store_failures = 0;

        loop {
            match state {
                AggregatorState::Connecting => {
                    tokio::select! {
                        _ = shutdown_requested(&mut shutdown) => return Ok(()),
                        connected = self.connect(&shard) => {
                            subscription = Some(connected?);
                            state = AggregatorState::Subscribed;
                        }
                    }
                }
                AggregatorState::Subscribed => {
                    info!("Listening for click events on {}", shard);
                    state = AggregatorState::Consuming;
                }
                AggregatorState::Consuming => {
                    let Some(active) = subscription.as_mut() else {
                        state = AggregatorState::Connecting;
                        continue;
                    };

                    let consumed = tokio::select! {
                        _ = shutdown_requested(&mut shutdown) => None,
                        consumed = self.consume_batch(&shard, active.as_mut()) => Some(consumed),
                    };

                    match consumed {
                        None => {
                            info!("Stopping click consumer on {}", shard);
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            warn!("Lost click stream connection on {}: {}", shard, e);
                            subscription = None;
                            state = AggregatorState::Connecting;
                        }
                        Some(Ok(BatchOutcome::Applied)) => store_failures = 0,
                        Some(Ok(BatchOutcome::StoreFailed(e))) => {
                            store_failures += 1;
                            let max_attempts = self.retry.max_attempts.max(1);
                            if store_failures >= max_attempts {
                                error!(
                                    "Giving up on {} after {} failed click writes: {}",
                                    shard, store_failures, e
                                );
                                return Err(e);
                            }

                            warn!(
                                "Click write failed on {} ({}/{}): {}",
                                shard, store_failures, max_attempts, e
                            );
                            active.rewind();
                            tokio::select! {
                                _ = shutdown_requested(&mut shutdown) => return Ok(()),
                                _ = tokio::time::sleep(self.retry.backoff) => {}
                            }
                        }
                    }
                }
            }
        }
    }

    async fn connect(&self, shard: &str) -> Result<Box<dyn ClickSubscription>, AppError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let strategy = FixedInterval::new(self.retry.backoff).take(max_attempts - 1);
        let attempt = Arc::new(AtomicUsize::new(0));

        let connector = self.connector.clone();
        let target = shard.to_string();
        let result = Retry::start(strategy, move || {
            let connector = connector.clone();
            let target = target.clone();
            let attempt = attempt.clone();
            async move {
                let n = attempt.fetch_add(1, Ordering::SeqCst) + 1;
                connector.subscribe(&target).await.inspect_err(|e| {
                    warn!(
                        "Waiting for click stream {} ({}/{}): {}",
                        target, n, max_attempts, e
                    );
                })
            }
        })
        .await;

        result.map_err(|e| {
            error!(
                "Click stream {} unavailable after {} attempts",
                shard, max_attempts
            );
            AppError::stream_unavailable(
                format!("Click stream unavailable after {max_attempts} attempts"),
                json!({ "shard": shard, "reason": e.to_string() }),
            )
        })
    }

    /// Applies one batch, stopping at the first entry that could not be
    /// stored. Only a lost connection is returned as an error.
    async fn consume_batch(
        &self,
        shard: &str,
        subscription: &mut dyn ClickSubscription,
    ) -> Result<BatchOutcome, AppError> {
        let batch = subscription.next_batch().await?;

        for message in batch {
            match self.apply_payload(&message.payload).await {
                Ok(event) => {
                    debug!("Recorded click for {} ({})", event.short_code, message.id);
                    subscription.commit(&message.id).await?;
                }
                Err(e @ AppError::Validation { .. }) => {
                    metrics::counter!("click_events_malformed_total").increment(1);
                    warn!("Skipping malformed click event {} on {}: {}", message.id, shard, e);
                    subscription.commit(&message.id).await?;
                }
                Err(e) => {
                    error!("Failed to record click {} on {}: {}", message.id, shard, e);
                    return Ok(BatchOutcome::StoreFailed(e));
                }
            }
        }

        Ok(BatchOutcome::Applied)
    }
}

/// Resolves once shutdown is signalled. A dropped sender never resolves.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let stopped = shutdown.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        std::future::pending::<()>().await;
    }
}
