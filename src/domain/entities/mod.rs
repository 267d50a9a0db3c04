//! Core domain entities.
//!
//! Entities are plain data structures without storage concerns.
//!
//! # Entity Types
//!
//! - [`Link`] - A short code to long URL mapping
//! - [`ClickCounter`] - Aggregated click statistics for one short code
//!
//! Creation input is modeled separately (`NewLink`) so the store assigns
//! `created_at`.

pub mod click_counter;
pub mod link;

pub use click_counter::ClickCounter;
pub use link::{Link, NewLink};
