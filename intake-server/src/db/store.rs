//! Contact store interface
//!
//! The HTTP layer only sees `ContactStore`. A `Connector` turns a connection
//! string into a live store; `ConnectionCache` decides when to call it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Contact, NewContact};

use super::memory::MemoryConnector;
use super::postgres::PgConnector;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("no store configured (set DATABASE_URL)")]
    NotConfigured,

    #[error("unsupported connection string scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid stored record {id}: {reason}")]
    InvalidRecord { id: Uuid, reason: String },
}

impl StoreError {
    /// Whether the error means the connection itself is unusable
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Sqlx(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::NotConfigured | Self::Unavailable(_) => true,
            Self::UnsupportedScheme(_) | Self::InvalidRecord { .. } => false,
        }
    }
}

/// Figures reported by the health check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub contacts: i64,
    #[serde(rename = "dataSize")]
    pub data_size_bytes: i64,
}

/// Persistence for contact records
#[async_trait]
pub trait ContactStore: Send + Sync + 'static {
    /// Insert one validated record, assigning id and timestamps.
    async fn insert(&self, contact: NewContact) -> Result<Uuid, StoreError>;

    /// All records, newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<Contact>, StoreError>;

    /// Liveness probe; does not touch contact data.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Names of databases visible through this connection
    async fn list_databases(&self) -> Result<Vec<String>, StoreError>;

    /// Release underlying connections
    async fn close(&self);
}

/// Opens a store from configuration
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Arc<dyn ContactStore>, StoreError>;

    /// Connection target safe to log (no credentials)
    fn describe(&self) -> String;
}

/// Connector used when no connection string is configured
pub struct UnconfiguredConnector;

#[async_trait]
impl Connector for UnconfiguredConnector {
    async fn connect(&self) -> Result<Arc<dyn ContactStore>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn describe(&self) -> String {
        "unconfigured".to_string()
    }
}

/// Pick a connector from the connection string scheme.
///
/// - `None` → every connection attempt fails with `NotConfigured`
/// - `memory://` → in-process store
/// - `postgres://`, `postgresql://` → Postgres pool
pub fn connector_for(database_url: Option<&str>) -> Result<Arc<dyn Connector>, StoreError> {
    let Some(url) = database_url else {
        return Ok(Arc::new(UnconfiguredConnector));
    };

    let scheme = url.split("://").next().unwrap_or_default();
    match scheme {
        "memory" => Ok(Arc::new(MemoryConnector::new())),
        "postgres" | "postgresql" => Ok(Arc::new(PgConnector::new(url))),
        other => Err(StoreError::UnsupportedScheme(other.to_owned())),
    }
}

/// Strip credentials from a connection string for logging.
pub fn redact_url(url: &str) -> String {
    match (url.split_once("://"), url.rfind('@')) {
        (Some((scheme, _)), Some(at)) => format!("{}://***@{}", scheme, &url[at + 1..]),
        _ => url.to_owned(),
    }
}
