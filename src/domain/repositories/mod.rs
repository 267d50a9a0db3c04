//! Repository trait definitions for the domain layer.
//!
//! These traits are the narrow seams through which the pipeline reaches
//! external systems. Implementations live in `crate::infrastructure`.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Durable short code to URL mapping
//! - [`ClickCounterRepository`] - Aggregated click statistics
//! - [`SequenceStore`] - Shared atomic counter for ID blocks
//! - [`ClickPublisher`] / [`ClickStreamConnector`] - Click event stream
//!
//! # Testing
//!
//! Mock implementations are generated via `mockall` under `cfg(test)`.
//! Integration tests use the in-memory doubles in `tests/common`.

pub mod click_counter_repository;
pub mod click_stream;
pub mod link_repository;
pub mod sequence_store;

pub use click_counter_repository::ClickCounterRepository;
pub use click_stream::{ClickPublisher, ClickStreamConnector, ClickSubscription, StreamMessage};
pub use link_repository::LinkRepository;
pub use sequence_store::SequenceStore;

#[cfg(test)]
pub use click_counter_repository::MockClickCounterRepository;
#[cfg(test)]
pub use click_stream::MockClickPublisher;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use sequence_store::MockSequenceStore;
