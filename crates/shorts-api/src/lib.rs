//! Axum HTTP API server.
//!
//! This crate provides:
//! - The editor-facing REST API (uploads, scripts, TTS, rendering, proxies)
//! - Server-side project and settings persistence
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::GeminiClient;
pub use state::AppState;
