//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{LinkService, StatsService};
use crate::domain::click_emitter::ClickEmitter;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Handles built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub stats_service: Arc<StatsService>,
    pub click_emitter: ClickEmitter,
    pub cache: Arc<dyn CacheService>,
    pub link_repository: Arc<dyn LinkRepository>,
    /// Prefix for returned short URLs, without a trailing slash.
    pub base_url: String,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        stats_service: Arc<StatsService>,
        click_emitter: ClickEmitter,
        cache: Arc<dyn CacheService>,
        link_repository: Arc<dyn LinkRepository>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            link_service,
            stats_service,
            click_emitter,
            cache,
            link_repository,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}
