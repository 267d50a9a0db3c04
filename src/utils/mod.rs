//! Utility functions shared across layers.
//!
//! - [`base62`] - Short code codec
//! - [`deadline`] - Timeouts for durable-store calls

pub mod base62;
pub mod deadline;
