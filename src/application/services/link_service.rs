//! Link creation and cache-aside resolution.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{Link, NewLink};
use crate::domain::id_allocator::BlockAllocator;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::base62;
use crate::utils::deadline::with_deadline;

/// Codes shadowed by fixed routes; IDs encoding to them are skipped.
const RESERVED_CODES: &[&str] = &["api", "health", "shorten"];

/// Service for creating and resolving short links.
///
/// The link repository is the source of truth. The cache is consulted first
/// on reads, primed after every insert and backfilled after every read miss.
/// Cache failures never fail a request; they degrade to a store read.
pub struct LinkService {
    allocator: Arc<BlockAllocator>,
    link_repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    cache_ttl: Duration,
    store_timeout: Duration,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        allocator: Arc<BlockAllocator>,
        link_repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        cache_ttl: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            allocator,
            link_repository,
            cache,
            cache_ttl,
            store_timeout,
        }
    }

    /// Creates a short link for `long_url`.
    ///
    /// # Flow
    ///
    /// 1. Take the next ID from the block allocator
    /// 2. Encode it as the short code, skipping IDs whose code is a fixed
    ///    route such as `health`
    /// 3. Insert the link
    /// 4. Prime the cache
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Allocation`] or [`AppError::Timeout`] if no ID can
    /// be allocated, and [`AppError::StoreWrite`] if the insert fails. An ID
    /// allocated for a failed insert is never reused.
    pub async fn create_short_link(&self, long_url: String) -> Result<Link, AppError> {
        let (id, code) = loop {
            let id = self.allocator.next_id().await?;
            let code = base62::encode(id);
            if !RESERVED_CODES.contains(&code.as_str()) {
                break (id, code);
            }
            debug!("Skipping id {} reserved as /{}", id, code);
        };

        let new_link = NewLink {
            id,
            code,
            long_url,
        };
        let link = with_deadline(
            self.store_timeout,
            "link insert",
            self.link_repository.insert(new_link),
        )
        .await?;

        self.cache_url(&link.code, &link.long_url).await;

        info!("Created short link {} (id {})", link.code, link.id);
        Ok(link)
    }

    /// Resolves a short code to its long URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidToken`] if `code` is not a base62 token,
    /// [`AppError::NotFound`] if neither cache nor store know it, and
    /// [`AppError::Internal`] or [`AppError::Timeout`] if the store fails.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        base62::decode(code)?;

        if let Some(url) = self.cached_url(code).await {
            metrics::counter!("resolution_cache_hits_total").increment(1);
            return Ok(url);
        }
        metrics::counter!("resolution_cache_misses_total").increment(1);

        let link = with_deadline(
            self.store_timeout,
            "link lookup",
            self.link_repository.find_by_code(code),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        self.cache_url(code, &link.long_url).await;

        Ok(link.long_url)
    }

    /// Whether the ID sequence store answers. Link creation fails without it
    /// once the current block runs out.
    pub async fn sequence_healthy(&self) -> bool {
        self.allocator.health_check().await
    }

    /// Constructs the full short URL from a base URL and code.
    pub fn get_short_url(&self, base_url: &str, code: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), code)
    }

    /// Reads the cache; errors and timeouts count as a miss.
    async fn cached_url(&self, code: &str) -> Option<String> {
        match tokio::time::timeout(self.store_timeout, self.cache.get_url(code)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(e)) => {
                warn!("Cache lookup failed for {}: {}", code, e);
                None
            }
            Err(_) => {
                warn!("Cache lookup for {} timed out", code);
                None
            }
        }
    }

    /// Best-effort cache write.
    async fn cache_url(&self, code: &str, long_url: &str) {
        match tokio::time::timeout(
            self.store_timeout,
            self.cache.set_url(code, long_url, self.cache_ttl),
        )
        .await
        {
            Ok(Ok(())) => debug!("Cached {} for {:?}", code, self.cache_ttl),
            Ok(Err(e)) => warn!("Failed to cache {}: {}", code, e),
            Err(_) => warn!("Cache write for {} timed out", code),
        }
    }
}
