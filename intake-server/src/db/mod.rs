//! Database layer - connection cache and contact stores
//!
//! # Design Principles
//!
//! - One lazily opened store handle per process, shared by all requests
//! - Handlers talk to `ContactStore`, never to a concrete driver
//! - Identity and timestamps are assigned here, never by the client

pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheState, ConnectionCache};
pub use memory::{MemoryConnector, MemoryContactStore};
pub use postgres::{PgConnector, PgContactStore};
pub use store::{connector_for, Connector, ContactStore, StoreError, StoreStats};
