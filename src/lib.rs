//! # NanoLink
//!
//! A distributed URL shortener: Redis-backed block ID allocation, base62
//! short codes, a cache-aside redirect path and asynchronous click
//! analytics over Redis Streams.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Entities, store traits, allocator, click pipeline
//! - **Application Layer** ([`application`]) - Link and statistics services
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL, Redis cache, sequence and stream
//! - **API Layer** ([`api`]) - HTTP handlers, DTOs and middleware
//!
//! ## Binaries
//!
//! - `nanolink` - HTTP API server
//! - `analytics-worker` - Click aggregation consumer
//! - `admin` - Codec and statistics CLI
//!
//! ## Configuration
//!
//! All binaries read environment variables via [`config::Config`].

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod routes;
pub mod server;
pub mod state;
pub mod utils;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for integration tests and library users.
pub mod prelude {
    pub use crate::application::services::{LinkService, StatsService};
    pub use crate::domain::click_emitter::ClickEmitter;
    pub use crate::domain::click_event::ClickEvent;
    pub use crate::domain::click_worker::{ClickAggregator, RetryPolicy};
    pub use crate::domain::entities::{ClickCounter, Link, NewLink};
    pub use crate::domain::id_allocator::BlockAllocator;
    pub use crate::domain::repositories::{
        ClickCounterRepository, ClickPublisher, ClickStreamConnector, ClickSubscription,
        LinkRepository, SequenceStore, StreamMessage,
    };
    pub use crate::error::AppError;
    pub use crate::infrastructure::cache::{CacheResult, CacheService};
    pub use crate::routes::app_router;
    pub use crate::state::AppState;
}
