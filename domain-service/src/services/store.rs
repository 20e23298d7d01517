use crate::models::domain::{Domain, KEY_FIELD, NAME_FIELD};
use crate::services::error::StoreError;
use async_trait::async_trait;
use mongodb::bson::{doc, Document};

/// Parameters of the key-or-name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOrNameFilter {
    pub token: String,
}

impl KeyOrNameFilter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn to_document(&self) -> Document {
        doc! {
            "$or": [
                { KEY_FIELD: self.token.as_str() },
                { NAME_FIELD: self.token.as_str() },
            ]
        }
    }

    pub fn matches(&self, domain: &Domain) -> bool {
        domain.key.as_deref() == Some(self.token.as_str()) || domain.name == self.token
    }
}

/// Gateway to the primary Domain collection.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Every Domain in store-native order.
    async fn list(&self) -> Result<Vec<Domain>, StoreError>;

    /// First Domain whose key or name equals the filter token.
    async fn find_by_key_or_name(
        &self,
        filter: &KeyOrNameFilter,
    ) -> Result<Option<Domain>, StoreError>;

    /// Insert a Domain and return its identity key, assigning one when the
    /// record has none. An existing key yields [`StoreError::Conflict`].
    async fn create(&self, domain: &Domain) -> Result<String, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
