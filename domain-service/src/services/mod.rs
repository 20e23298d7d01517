pub mod content_store;
pub mod database;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod store;

pub use content_store::{CanonicalRecord, ContentStore, HttpContentStore, CID_PREFIX};
pub use database::MongoDb;
pub use error::{ContentStoreError, StoreError};
pub use memory::{InMemoryContentStore, InMemoryDomainStore};
pub use self::metrics::{get_metrics, init_metrics};
pub use store::{DomainStore, KeyOrNameFilter};
