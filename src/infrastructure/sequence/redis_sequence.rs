//! Redis `INCRBY` sequence store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde_json::json;
use tracing::info;

use crate::domain::repositories::SequenceStore;
use crate::error::AppError;

/// Sequence counter kept in a single Redis key.
///
/// `INCRBY` is atomic on the server, so every allocator in the deployment
/// sees a distinct block end.
pub struct RedisSequenceStore {
    client: ConnectionManager,
}

impl RedisSequenceStore {
    /// Connects to Redis and checks the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Allocation`] if Redis cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        info!("Connecting to Redis sequence store");

        let client = Client::open(redis_url).map_err(|e| unreachable(&e))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| unreachable(&e))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| unreachable(&e))?;

        info!("✓ Connected to Redis sequence store");

        Ok(Self::from_manager(manager))
    }

    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { client: manager }
    }
}

fn unreachable(e: &redis::RedisError) -> AppError {
    AppError::allocation(
        "Sequence store unavailable",
        json!({ "reason": e.to_string() }),
    )
}

#[async_trait]
impl SequenceStore for RedisSequenceStore {
    async fn increment_by(&self, key: &str, delta: u64) -> Result<u64, AppError> {
        let delta = i64::try_from(delta).map_err(|_| {
            AppError::allocation("Block size out of range", json!({ "delta": delta }))
        })?;

        let mut conn = self.client.clone();
        let value: i64 = conn.incr(key, delta).await.map_err(|e| {
            AppError::allocation(
                "Sequence increment failed",
                json!({ "key": key, "reason": e.to_string() }),
            )
        })?;

        u64::try_from(value).map_err(|_| {
            AppError::allocation(
                "Sequence counter is negative",
                json!({ "key": key, "value": value }),
            )
        })
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
