//! PostgreSQL repository implementations.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! `FromRow` row structs, so the crate builds without a live database.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage and retrieval
//! - [`PgClickCounterRepository`] - Click counter upserts and reads

pub mod pg_click_counter_repository;
pub mod pg_link_repository;

pub use pg_click_counter_repository::PgClickCounterRepository;
pub use pg_link_repository::PgLinkRepository;

/// Embedded schema migrations from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
