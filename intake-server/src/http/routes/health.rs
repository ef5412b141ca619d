//! Health check endpoint
//!
//! Reports the cached store state. Never opens a new connection: a process
//! that has not connected yet reports `disconnected`.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::db::StoreStats;
use crate::http::server::AppState;

/// Store status as seen by the health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
    PingFailed,
}

/// Extra store figures; empty when disconnected
#[derive(Debug, Default, Serialize)]
pub struct DatabaseDetails {
    #[serde(flatten)]
    pub stats: Option<StoreStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: DatabaseStatus,
    pub database_details: DatabaseDetails,
    pub timestamp: String,
    pub environment: String,
    pub version: &'static str,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut details = DatabaseDetails::default();

    let database = match state.connections.current().await {
        None => DatabaseStatus::Disconnected,
        Some(store) => match store.ping().await {
            Ok(()) => {
                match store.stats().await {
                    Ok(stats) => details.stats = Some(stats),
                    Err(e) => details.error = Some(e.to_string()),
                }
                DatabaseStatus::Connected
            }
            Err(e) => {
                tracing::warn!(error = %e, "store ping failed");
                details.error = Some(e.to_string());
                state.connections.reset(&store).await;
                DatabaseStatus::PingFailed
            }
        },
    };

    Json(HealthResponse {
        status: "OK",
        database,
        database_details: details,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: state.config.environment.to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
