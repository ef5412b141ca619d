//! In-process contact store
//!
//! Selected with `DATABASE_URL=memory://`. Data lives as long as the process.
//! The availability switch lets tests simulate an outage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Contact, NewContact};

use super::store::{Connector, ContactStore, StoreError, StoreStats};

/// Contact store backed by a vector in insertion order
pub struct MemoryContactStore {
    contacts: RwLock<Vec<Contact>>,
    available: AtomicBool,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self {
            contacts: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Make every operation fail (or succeed again)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

impl Default for MemoryContactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn insert(&self, contact: NewContact) -> Result<Uuid, StoreError> {
        self.check_available()?;
        let contact = contact.into_contact(Utc::now());
        let id = contact.id;
        self.contacts.write().await.push(contact);
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Contact>, StoreError> {
        self.check_available()?;
        let mut contacts: Vec<Contact> = self.contacts.read().await.iter().rev().cloned().collect();
        // Stable sort: equal timestamps keep later-inserted first
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.check_available()?;
        let contacts = self.contacts.read().await;
        let data_size_bytes = contacts
            .iter()
            .map(|c| serde_json::to_vec(c).map(|v| v.len()).unwrap_or(0))
            .sum::<usize>();
        Ok(StoreStats {
            contacts: contacts.len() as i64,
            data_size_bytes: data_size_bytes as i64,
        })
    }

    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        Ok(vec!["memory".to_string()])
    }

    async fn close(&self) {}
}

/// Hands out the same in-process store on every connect
pub struct MemoryConnector {
    store: Arc<MemoryContactStore>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryContactStore::new()))
    }

    /// Share an existing store (for testing)
    pub fn with_store(store: Arc<MemoryContactStore>) -> Self {
        Self { store }
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn ContactStore>, StoreError> {
        self.store.ping().await?;
        let store: Arc<dyn ContactStore> = self.store.clone();
        Ok(store)
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactSubmission;
    use serde_json::json;

    fn new_contact(name: &str) -> NewContact {
        let body = json!({
            "name": name,
            "email": "cliente@example.com",
            "service": "outros",
            "message": "Mensagem de teste longa o bastante."
        });
        ContactSubmission::validate(body.as_object().unwrap())
            .unwrap()
            .with_ip(None)
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryContactStore::new();
        store.insert(new_contact("Primeiro")).await.unwrap();
        store.insert(new_contact("Segundo")).await.unwrap();
        store.insert(new_contact("Terceiro")).await.unwrap();

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Terceiro", "Segundo", "Primeiro"]);
    }

    #[tokio::test]
    async fn offline_store_fails_every_operation() {
        let store = MemoryContactStore::new();
        store.set_available(false);

        assert!(store.ping().await.is_err());
        assert!(store.insert(new_contact("Ana")).await.is_err());
        assert!(store.list_all().await.is_err());
        assert!(store.is_empty().await);

        store.set_available(true);
        store.insert(new_contact("Ana")).await.unwrap();
        assert_eq!(store.stats().await.unwrap().contacts, 1);
    }

    #[tokio::test]
    async fn connector_shares_one_store() {
        let store = Arc::new(MemoryContactStore::new());
        let connector = MemoryConnector::with_store(store.clone());

        let handle = connector.connect().await.unwrap();
        handle.insert(new_contact("Ana")).await.unwrap();

        let again = connector.connect().await.unwrap();
        assert_eq!(again.list_all().await.unwrap().len(), 1);
        assert_eq!(store.len().await, 1);
    }
}
