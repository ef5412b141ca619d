//! Postgres contact store
//!
//! Uses sqlx PgPool with explicit connection limits. The `contacts` table is
//! created on first connect if it does not exist yet.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Contact, NewContact, ServiceKind};

use super::store::{redact_url, Connector, ContactStore, StoreError, StoreStats};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// How long a request waits for a pooled connection before giving up.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects to Postgres and prepares the schema
pub struct PgConnector {
    database_url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> Result<Arc<dyn ContactStore>, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.database_url)
            .await?;

        let store = PgContactStore::new(pool);
        store.ping().await?;
        store.ensure_schema().await?;

        Ok(Arc::new(store))
    }

    fn describe(&self) -> String {
        redact_url(&self.database_url)
    }
}

/// Contact row as stored
#[derive(Debug, FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    service: String,
    message: String,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StoreError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let service = row
            .service
            .parse::<ServiceKind>()
            .map_err(|e| StoreError::InvalidRecord {
                id: row.id,
                reason: e.to_string(),
            })?;

        Ok(Contact {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            service,
            message: row.message,
            ip_address: row.ip_address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Contact store over a Postgres pool
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the contacts table if missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id UUID PRIMARY KEY,
                seq BIGSERIAL NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                service TEXT NOT NULL CHECK (service IN (
                    'isolamento', 'isolamento-metalico', 'ar-condicionado', 'dutos', 'outros'
                )),
                message TEXT NOT NULL,
                ip_address TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn insert(&self, contact: NewContact) -> Result<Uuid, StoreError> {
        let contact = contact.into_contact(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO contacts
                (id, name, email, phone, service, message, ip_address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(contact.id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.service.as_str())
        .bind(&contact.message)
        .bind(&contact.ip_address)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(contact.id)
    }

    async fn list_all(&self) -> Result<Vec<Contact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, phone, service, message, ip_address, created_at, updated_at
            FROM contacts
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let (contacts, data_size_bytes): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), pg_total_relation_size('contacts') FROM contacts",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            contacts,
            data_size_bytes,
        })
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT datname FROM pg_database WHERE NOT datistemplate ORDER BY datname",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
