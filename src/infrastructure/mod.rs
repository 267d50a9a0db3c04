//! Infrastructure layer for external integrations.
//!
//! Concrete implementations of the domain traits.
//!
//! # Modules
//!
//! - [`cache`] - Resolution cache (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL link and click counter repositories
//! - [`sequence`] - Redis-backed shared ID sequence
//! - [`stream`] - Redis Streams click event producer and consumer

pub mod cache;
pub mod persistence;
pub mod sequence;
pub mod stream;
