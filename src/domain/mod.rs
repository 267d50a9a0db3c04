//! Domain layer containing the short link pipeline.
//!
//! Nothing here depends on a concrete database, cache or stream; external
//! systems are reached through the traits in [`repositories`].
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`id_allocator`] - Block-based unique ID allocation
//! - [`click_event`] - Click tracking event model
//! - [`click_emitter`] - Fire-and-forget click publication
//! - [`click_worker`] - Click aggregation consumer
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler resolves the code and builds a [`click_event::ClickEvent`]
//! 2. [`click_emitter::ClickEmitter`] publishes it on a detached task
//! 3. The analytics worker's [`click_worker::ClickAggregator`] consumes it
//! 4. The click is folded into a counter via [`repositories::ClickCounterRepository`]

pub mod click_emitter;
pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod id_allocator;
pub mod repositories;
