//! REST API layer for HTTP request/response handling.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request tracing
//! - [`routes`] - Routes nested under `/api`

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
