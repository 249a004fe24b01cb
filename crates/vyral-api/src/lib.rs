//! Axum HTTP server for the Vyral job operations.
//!
//! This crate provides:
//! - One authenticated POST route per operation
//! - Request validation (required fields, webhook URL policy)
//! - The operation catalogue wiring providers into orchestrator descriptors
//! - Rate limiting, security headers and Prometheus metrics

pub mod catalog;
pub mod composite;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use catalog::OperationCatalog;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
