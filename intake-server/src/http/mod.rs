//! HTTP server layer
//!
//! Axum server with:
//! - CORS (configured origin allow-list)
//! - Request tracing and security headers
//! - Per-client rate limiting
//! - Graceful shutdown
//! - JSON error responses, including for panics and unmatched paths

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
