//! Application layer services.
//!
//! Services orchestrate the domain pipeline for the HTTP handlers and the
//! admin CLI. They depend on repository traits only.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Short link creation and cache-aside resolution
//! - [`services::stats_service::StatsService`] - Click counter lookup
//!
//! Click aggregation runs in the analytics worker; see
//! [`crate::domain::click_worker`].

pub mod services;
