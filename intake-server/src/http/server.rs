//! Axum server setup
//!
//! Server skeleton with:
//! - Origin allow-list CORS
//! - Tracing middleware
//! - Per-client rate limiting
//! - Graceful shutdown on SIGTERM/Ctrl+C, closing the store connection

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{not_found, panic_response, rate_limit, security_headers, RateLimiter};
use super::routes;
use crate::config::AppConfig;
use crate::db::{connector_for, ConnectionCache, Connector, StoreError};

/// Maximum accepted request body
pub const BODY_LIMIT_BYTES: usize = 10 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    /// Lazily opened store handle
    pub connections: ConnectionCache,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, connector: Arc<dyn Connector>) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit);
        Self {
            config,
            connections: ConnectionCache::new(connector),
            rate_limiter,
        }
    }

    /// Build state with the connector named by `config.database_url`
    pub fn from_config(config: AppConfig) -> Result<Self, StoreError> {
        let connector = connector_for(config.database_url.as_deref())?;
        Ok(Self::new(config, connector))
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(super::extractors::ADMIN_KEY_HEADER),
        ])
        .allow_credentials(true)
}

/// Build the application router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .merge(routes::root::router())
        .merge(routes::health::router())
        .merge(routes::contacts::router())
        .merge(routes::diagnostics::router());

    with_middleware(routes, state)
}

/// Wrap `routes` in the fallback and the full middleware stack
fn with_middleware(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    let expose_details = state.config.environment.exposes_error_details();

    routes
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(cors_layer(&state.config))
        .layer(middleware::map_response(security_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| panic_response(err, expose_details),
        ))
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::from_config(AppConfig::from_env()?)?);
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: Arc<AppState>, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(state.clone());

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        environment = %state.config.environment,
        "Server listening on {}",
        config.bind_addr
    );

    // Run with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.connections.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
