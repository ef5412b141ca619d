//! Store connectivity test
//!
//! `/test-mongodb` is kept as an alias for older clients.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct StoreTestResponse {
    pub success: bool,
    pub databases: Vec<String>,
    pub message: &'static str,
}

/// GET /test-db - connect (if needed) and list visible databases
async fn test_store(State(state): State<Arc<AppState>>) -> Result<Json<StoreTestResponse>, ApiError> {
    let store = state
        .connections
        .get()
        .await
        .map_err(|_| ApiError::StoreUnavailable)?;

    // Detail is always echoed on this route
    let databases = store
        .list_databases()
        .await
        .map_err(|e| ApiError::store(e, true))?;

    tracing::info!(?databases, "store connectivity test passed");
    Ok(Json(StoreTestResponse {
        success: true,
        databases,
        message: "Conexão com o banco de dados testada com sucesso",
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test-db", get(test_store))
        .route("/test-mongodb", get(test_store))
}
