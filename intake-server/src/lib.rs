//! intake-server: HTTP intake API for contact-form submissions
//!
//! Accepts submissions, strips markup, validates them against a fixed
//! schema and stores them through a lazily connected, cached store handle.

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{AppConfig, ConfigError, Environment};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
