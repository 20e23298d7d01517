//! In-process stores for tests and for running without external services.

use crate::models::{domain::NAME_FIELD, Domain};
use crate::services::content_store::{CanonicalRecord, ContentStore};
use crate::services::error::{ContentStoreError, StoreError};
use crate::services::store::{DomainStore, KeyOrNameFilter};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Insertion-ordered Domain store.
#[derive(Default)]
pub struct InMemoryDomainStore {
    domains: RwLock<Vec<Domain>>,
}

impl InMemoryDomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.domains.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.domains.read().await.is_empty()
    }
}

#[async_trait]
impl DomainStore for InMemoryDomainStore {
    async fn list(&self) -> Result<Vec<Domain>, StoreError> {
        Ok(self.domains.read().await.clone())
    }

    async fn find_by_key_or_name(
        &self,
        filter: &KeyOrNameFilter,
    ) -> Result<Option<Domain>, StoreError> {
        let domains = self.domains.read().await;
        Ok(domains.iter().find(|domain| filter.matches(domain)).cloned())
    }

    async fn create(&self, domain: &Domain) -> Result<String, StoreError> {
        let mut record = domain.clone();
        let key = record
            .key
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let mut domains = self.domains.write().await;
        if domains.iter().any(|d| d.key.as_deref() == Some(key.as_str())) {
            return Err(StoreError::Conflict(key));
        }
        domains.push(record);
        Ok(key)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
struct ContentIndex {
    objects: HashMap<String, String>,
    names: HashMap<String, String>,
}

/// Content store held in memory.
///
/// Objects are keyed by CID. The `name` member of each stored record is
/// indexed too, so a name resolves to the latest record stored under it.
#[derive(Default)]
pub struct InMemoryContentStore {
    index: RwLock<ContentIndex>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.objects.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn lookup(&self, key: &str) -> Result<Option<String>, ContentStoreError> {
        let index = self.index.read().await;
        let cid = index.names.get(key).map(String::as_str).unwrap_or(key);
        Ok(index.objects.get(cid).cloned())
    }

    async fn store(&self, record: &CanonicalRecord) -> Result<(), ContentStoreError> {
        let name = match serde_json::from_str::<Value>(&record.json)? {
            Value::Object(mut members) => match members.remove(NAME_FIELD) {
                Some(Value::String(name)) if !name.is_empty() => Some(name),
                _ => None,
            },
            _ => None,
        };

        let mut index = self.index.write().await;
        index
            .objects
            .entry(record.cid.clone())
            .or_insert_with(|| record.json.clone());
        if let Some(name) = name {
            index.names.insert(name, record.cid.clone());
        }
        Ok(())
    }
}
