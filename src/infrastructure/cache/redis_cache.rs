//! Redis-backed resolution cache.

use std::time::Duration;

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

/// Key namespace for cached resolutions.
pub const KEY_PREFIX: &str = "url:";

/// Resolution cache stored as plain Redis strings with `SET EX`.
///
/// Expiry is enforced by Redis itself. Errors are returned to the caller,
/// which treats them as misses.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis cache");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis cache");

        Ok(Self::from_manager(manager))
    }

    /// Wraps an existing connection, sharing it with other Redis adapters.
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { client: manager }
    }
}

fn build_key(short_code: &str) -> String {
    format!("{}{}", KEY_PREFIX, short_code)
}

/// Redis rejects `SET EX 0`, so sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();

        let hit = conn
            .get::<_, Option<String>>(build_key(short_code))
            .await
            .map_err(|e| CacheError::OperationError(format!("GET {}: {}", short_code, e)))?;

        debug!(
            "Cache {}: {}",
            if hit.is_some() { "HIT" } else { "MISS" },
            short_code
        );
        Ok(hit)
    }

    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let seconds = ttl_seconds(ttl);

        conn.set_ex::<_, _, ()>(build_key(short_code), long_url, seconds)
            .await
            .map_err(|e| CacheError::OperationError(format!("SET {}: {}", short_code, e)))?;

        debug!("Cache SET: {} (TTL: {}s)", short_code, seconds);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
