//! Redis Streams producer and consumer-group subscriptions.

use async_trait::async_trait;
use redis::streams::{StreamId, StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, Cmd, aio::ConnectionManager, aio::MultiplexedConnection};
use serde_json::json;
use tracing::{debug, info};

use crate::domain::repositories::{
    ClickPublisher, ClickStreamConnector, ClickSubscription, StreamMessage,
};
use crate::error::AppError;

/// Entry field holding the JSON click event.
pub const PAYLOAD_FIELD: &str = "payload";

/// Maximum entries fetched per read.
const READ_COUNT: usize = 100;

/// Server-side block per read. Kept below the client's response timeout.
const BLOCK_MS: usize = 400;

fn unavailable(context: &str, e: &redis::RedisError) -> AppError {
    AppError::stream_unavailable(
        format!("Click stream {context} failed"),
        json!({ "reason": e.to_string() }),
    )
}

/// `XADD shard MAXLEN ~ max_len * payload <payload>`.
///
/// Approximate trimming lets Redis drop whole internal nodes, so a shard
/// may briefly hold somewhat more than `max_len` entries.
fn append_command(shard: &str, max_len: usize, payload: &str) -> Cmd {
    let mut cmd = redis::cmd("XADD");
    cmd.arg(shard)
        .arg(StreamMaxlen::Approx(max_len))
        .arg("*")
        .arg(PAYLOAD_FIELD)
        .arg(payload);
    cmd
}

/// Producer side of the click stream.
pub struct RedisClickStream {
    client: ConnectionManager,
    max_len: usize,
}

impl RedisClickStream {
    /// Connects to the stream server and checks the connection with a PING.
    ///
    /// Each shard is capped at roughly `max_len` entries. Entries trimmed
    /// before a worker read them are lost, so the cap must cover the longest
    /// expected worker outage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StreamUnavailable`] if the server cannot be reached.
    pub async fn connect(stream_url: &str, max_len: usize) -> Result<Self, AppError> {
        info!("Connecting to click stream");

        let client = Client::open(stream_url).map_err(|e| unavailable("connect", &e))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| unavailable("connect", &e))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| unavailable("PING", &e))?;

        info!("✓ Connected to click stream");

        Ok(Self {
            client: manager,
            max_len,
        })
    }
}

#[async_trait]
impl ClickPublisher for RedisClickStream {
    async fn publish(&self, shard: &str, payload: String) -> Result<(), AppError> {
        let mut conn = self.client.clone();
        let id: String = append_command(shard, self.max_len, &payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("XADD", &e))?;

        debug!("XADD {} -> {}", shard, id);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

/// Opens consumer-group subscriptions, one connection per shard.
pub struct RedisStreamConnector {
    stream_url: String,
    group: String,
    consumer: String,
}

impl RedisStreamConnector {
    pub fn new(
        stream_url: impl Into<String>,
        group: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Self {
        Self {
            stream_url: stream_url.into(),
            group: group.into(),
            consumer: consumer.into(),
        }
    }
}

#[async_trait]
impl ClickStreamConnector for RedisStreamConnector {
    async fn subscribe(&self, shard: &str) -> Result<Box<dyn ClickSubscription>, AppError> {
        let client = Client::open(self.stream_url.as_str()).map_err(|e| unavailable("connect", &e))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| unavailable("connect", &e))?;

        // Starting at "0" lets a new group see entries published before the
        // first worker ever ran.
        let created: Result<(), redis::RedisError> =
            conn.xgroup_create_mkstream(shard, &self.group, "0").await;
        match created {
            Ok(()) => info!("Created consumer group {} on {}", self.group, shard),
            Err(e) if e.code() == Some("BUSYGROUP") => {
                debug!("Consumer group {} already exists on {}", self.group, shard)
            }
            Err(e) => return Err(unavailable("XGROUP CREATE", &e)),
        }

        Ok(Box::new(RedisSubscription {
            conn,
            shard: shard.to_string(),
            group: self.group.clone(),
            consumer: self.consumer.clone(),
            replay_from: Some("0".to_string()),
        }))
    }
}

/// A consumer-group reader on one shard.
///
/// Starts by replaying this consumer's pending entries (read but never
/// acknowledged), then switches to new entries. [`ClickSubscription::rewind`]
/// goes back to replaying pending entries from the start.
struct RedisSubscription {
    conn: MultiplexedConnection,
    shard: String,
    group: String,
    consumer: String,
    replay_from: Option<String>,
}

fn to_message(entry: StreamId) -> StreamMessage {
    let payload = entry
        .get::<String>(PAYLOAD_FIELD)
        .unwrap_or_default();
    StreamMessage {
        id: entry.id,
        payload,
    }
}

#[async_trait]
impl ClickSubscription for RedisSubscription {
    async fn next_batch(&mut self) -> Result<Vec<StreamMessage>, AppError> {
        let start = self.replay_from.clone().unwrap_or_else(|| ">".to_string());
        let mut options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(READ_COUNT);
        if self.replay_from.is_none() {
            options = options.block(BLOCK_MS);
        }

        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[&self.shard], &[&start], &options)
            .await
            .map_err(|e| unavailable("XREADGROUP", &e))?;

        let messages: Vec<StreamMessage> = reply
            .map(|reply| {
                reply
                    .keys
                    .into_iter()
                    .flat_map(|key| key.ids)
                    .map(to_message)
                    .collect()
            })
            .unwrap_or_default();

        if self.replay_from.is_some() {
            match messages.last() {
                Some(last) => self.replay_from = Some(last.id.clone()),
                None => {
                    debug!("Pending entries on {} replayed", self.shard);
                    self.replay_from = None;
                }
            }
        }

        Ok(messages)
    }

    async fn commit(&mut self, id: &str) -> Result<(), AppError> {
        let _: i64 = self
            .conn
            .xack(&self.shard, &self.group, &[id])
            .await
            .map_err(|e| unavailable("XACK", &e))?;
        Ok(())
    }

    fn rewind(&mut self) {
        self.replay_from = Some("0".to_string());
    }
}
