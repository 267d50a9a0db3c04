//! Producer and consumer seams of the click event stream.

use crate::error::AppError;
use async_trait::async_trait;

/// A raw entry read from one shard of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Stream-assigned entry ID, used to commit progress.
    pub id: String,
    /// JSON-encoded [`crate::domain::click_event::ClickEvent`].
    pub payload: String,
}

/// Publishes click payloads.
///
/// # Implementations
///
/// - [`crate::infrastructure::stream::RedisClickStream`] - Redis Streams `XADD`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickPublisher: Send + Sync {
    /// Appends `payload` to `shard`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StreamUnavailable`] if the stream rejects the write.
    async fn publish(&self, shard: &str, payload: String) -> Result<(), AppError>;

    /// Checks that the stream answers commands.
    async fn health_check(&self) -> bool;
}

/// Opens subscriptions on stream shards.
///
/// # Implementations
///
/// - [`crate::infrastructure::stream::RedisStreamConnector`] - Redis Streams consumer groups
#[async_trait]
pub trait ClickStreamConnector: Send + Sync {
    /// Connects to the stream and joins the consumer group for `shard`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StreamUnavailable`] if the connection or the group
    /// setup fails.
    async fn subscribe(&self, shard: &str) -> Result<Box<dyn ClickSubscription>, AppError>;
}

/// A live subscription to one shard.
///
/// Messages are delivered in shard order, starting with entries this
/// consumer read but never committed before a restart.
#[async_trait]
pub trait ClickSubscription: Send {
    /// Waits for the next batch. An empty batch means the poll timed out.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StreamUnavailable`] when the connection is lost.
    async fn next_batch(&mut self) -> Result<Vec<StreamMessage>, AppError>;

    /// Marks `id` as processed so it is not redelivered.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StreamUnavailable`] when the connection is lost.
    async fn commit(&mut self, id: &str) -> Result<(), AppError>;

    /// Makes the following [`next_batch`](Self::next_batch) calls deliver
    /// again, in shard order, every entry read but not yet committed.
    fn rewind(&mut self);
}
