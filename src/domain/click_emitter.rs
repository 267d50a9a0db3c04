//! Fire-and-forget publication of click events.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickPublisher;

/// Name of the stream shard with the given index.
///
/// A single-shard stream uses the bare stream name.
pub fn shard_name(stream: &str, shards: u32, index: u32) -> String {
    if shards <= 1 {
        stream.to_string()
    } else {
        format!("{stream}:{index}")
    }
}

/// Stable shard index for a short code (FNV-1a).
///
/// All clicks of one code land on the same shard, so they are aggregated in
/// publication order.
pub fn shard_index(code: &str, shards: u32) -> u32 {
    if shards <= 1 {
        return 0;
    }

    let mut hash: u32 = 0x811c_9dc5;
    for byte in code.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash % shards
}

/// Publishes click events without blocking the caller.
///
/// Each [`ClickEmitter::emit`] spawns a detached task. The caller never
/// observes the outcome: failures are logged and counted, never retried.
/// Without a publisher every emission is a no-op.
#[derive(Clone)]
pub struct ClickEmitter {
    publisher: Option<Arc<dyn ClickPublisher>>,
    stream: String,
    shards: u32,
}

impl ClickEmitter {
    pub fn new(publisher: Arc<dyn ClickPublisher>, stream: impl Into<String>, shards: u32) -> Self {
        Self {
            publisher: Some(publisher),
            stream: stream.into(),
            shards: shards.max(1),
        }
    }

    /// An emitter that drops every event.
    pub fn disabled() -> Self {
        Self {
            publisher: None,
            stream: String::new(),
            shards: 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.publisher.is_some()
    }

    /// Shard that clicks of `code` are published to.
    pub fn shard_for(&self, code: &str) -> String {
        shard_name(&self.stream, self.shards, shard_index(code, self.shards))
    }

    /// Publishes `event` on a detached task.
    ///
    /// The returned handle may be dropped; the task keeps running either
    /// way. Returns `None` when emission is disabled or the event could not
    /// be serialized.
    pub fn emit(&self, event: ClickEvent) -> Option<JoinHandle<()>> {
        let publisher = self.publisher.clone()?;

        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize click event for {}: {}", event.short_code, e);
                return None;
            }
        };
        let shard = self.shard_for(&event.short_code);

        Some(tokio::spawn(async move {
            match publisher.publish(&shard, payload).await {
                Ok(()) => {
                    metrics::counter!("click_events_published_total").increment(1);
                    debug!("Published click for {} to {}", event.short_code, shard);
                }
                Err(e) => {
                    metrics::counter!("click_events_publish_failed_total").increment(1);
                    warn!("Failed to publish click for {}: {}", event.short_code, e);
                }
            }
        }))
    }

    /// Reports whether the stream is reachable. A disabled emitter is
    /// reported as unhealthy.
    pub async fn health_check(&self) -> bool {
        match &self.publisher {
            Some(publisher) => publisher.health_check().await,
            None => false,
        }
    }
}
