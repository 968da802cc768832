//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /api/generate-clip`: download footage, cut segments around markers, return one MP4
//! - `POST /api/clips/plan`: preview the merged segments for a set of markers
//! - Rate limiting, security headers and source URL validation
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
