use crate::models::domain::{Domain, KEY_FIELD, NAME_FIELD};
use crate::services::error::StoreError;
use crate::services::store::{DomainStore, KeyOrNameFilter};
use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
    collection: String,
    timeout: Duration,
}

impl MongoDb {
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            StoreError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(
            database = %database,
            collection = %collection,
            "Successfully connected to MongoDB database"
        );
        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
            timeout,
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for domain-service");

        let key_index = IndexModel::builder()
            .keys(doc! { KEY_FIELD: 1 })
            .options(
                IndexOptions::builder()
                    .name("key_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let name_index = IndexModel::builder()
            .keys(doc! { NAME_FIELD: 1 })
            .options(
                IndexOptions::builder()
                    .name("name_lookup".to_string())
                    .build(),
            )
            .build();

        self.bounded(
            "create_indexes",
            self.domains().create_indexes([key_index, name_index], None),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                collection = %self.collection,
                "Failed to create indexes on domain collection: {}",
                e
            );
            e
        })?;
        tracing::info!(collection = %self.collection, "Created indexes on _key and name");

        Ok(())
    }

    pub fn domains(&self) -> Collection<Domain> {
        self.db.collection(&self.collection)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    /// Run a driver call under the configured store timeout.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, mongodb::error::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }

    /// Documents are read without the driver-assigned `_id`.
    fn projection() -> Document {
        doc! { "_id": 0 }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl DomainStore for MongoDb {
    async fn list(&self) -> Result<Vec<Domain>, StoreError> {
        self.bounded("list", async {
            let options = FindOptions::builder()
                .projection(Self::projection())
                .build();
            let mut cursor = self.domains().find(None, options).await?;

            let mut domains = Vec::new();
            while let Some(next) = cursor.next().await {
                match next {
                    Ok(domain) => {
                        tracing::debug!(key = ?domain.key, "Got domain from list query");
                        domains.push(domain);
                    }
                    // A malformed document is skipped, the rest of the cursor is still read
                    Err(e) if matches!(e.kind.as_ref(), ErrorKind::BsonDeserialization(_)) => {
                        tracing::error!("Failed to read domain document: {}", e);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok::<_, mongodb::error::Error>(domains)
        })
        .await
    }

    async fn find_by_key_or_name(
        &self,
        filter: &KeyOrNameFilter,
    ) -> Result<Option<Domain>, StoreError> {
        let options = FindOneOptions::builder()
            .projection(Self::projection())
            .build();
        self.bounded(
            "find_by_key_or_name",
            self.domains().find_one(filter.to_document(), options),
        )
        .await
    }

    async fn create(&self, domain: &Domain) -> Result<String, StoreError> {
        let mut record = domain.clone();
        let key = record
            .key
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        match self
            .bounded("create", self.domains().insert_one(&record, None))
            .await
        {
            Ok(_) => Ok(key),
            Err(StoreError::Database(e)) if is_duplicate_key(&e) => Err(StoreError::Conflict(key)),
            Err(e) => Err(e),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.bounded(
            "ping",
            self.client
                .database("admin")
                .run_command(doc! { "ping": 1 }, None),
        )
        .await
        .map_err(|e| {
            tracing::error!("MongoDB health check failed: {}", e);
            e
        })?;
        Ok(())
    }
}
