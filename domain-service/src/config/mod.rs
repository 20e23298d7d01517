use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub store: StoreConfig,
    pub content_store: ContentStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    /// Single collection serving list, lookup and create.
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentStoreConfig {
    pub backend: ContentStoreBackend,
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentStoreBackend {
    Memory,
    Http,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ContentStoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DomainConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, APP__ prefix and MS_PORT)
        let common_config = core_config::Config::load()?;
        Self::from_source(common_config, |key| env::var(key).ok())
    }

    /// Build the service config from `lookup`, a source of environment-style
    /// variables.
    pub fn from_source<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let get = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let store = StoreConfig {
            backend: get("DOMAIN_STORE_BACKEND", Some("mongo"))?.parse()?,
            timeout_secs: parse_secs(
                "STORE_TIMEOUT_SECS",
                &get("STORE_TIMEOUT_SECS", Some("10"))?,
            )?,
        };

        // The in-memory content store only pairs with the in-memory domain store
        let default_content_backend = match store.backend {
            StoreBackend::Mongo => "http",
            StoreBackend::Memory => "memory",
        };
        let content_store = ContentStoreConfig {
            backend: get("CONTENT_STORE_BACKEND", Some(default_content_backend))?.parse()?,
            url: lookup("CONTENT_STORE_URL"),
            timeout_secs: parse_secs(
                "CONTENT_STORE_TIMEOUT_SECS",
                &get("CONTENT_STORE_TIMEOUT_SECS", Some("5"))?,
            )?,
        };
        if content_store.backend == ContentStoreBackend::Http && content_store.url.is_none() {
            return Err(config_error(
                "CONTENT_STORE_URL is required when CONTENT_STORE_BACKEND=http",
            ));
        }
        if store.backend == StoreBackend::Mongo
            && content_store.backend == ContentStoreBackend::Memory
        {
            return Err(config_error(
                "CONTENT_STORE_BACKEND=memory requires DOMAIN_STORE_BACKEND=memory",
            ));
        }

        Ok(DomainConfig {
            common,
            log_level: get("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT"),
            mongodb: MongoConfig {
                uri: get("MONGODB_URI", Some("mongodb://localhost:27017"))?,
                database: get("MONGODB_DATABASE", Some("domain_db"))?,
                collection: get("DOMAIN_COLLECTION", Some("domains"))?,
            },
            store,
            content_store,
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(config_error(format!("Invalid domain store backend: {}", s))),
        }
    }
}

impl std::str::FromStr for ContentStoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(ContentStoreBackend::Memory),
            "http" => Ok(ContentStoreBackend::Http),
            _ => Err(config_error(format!("Invalid content store backend: {}", s))),
        }
    }
}

fn config_error(msg: impl Into<String>) -> AppError {
    AppError::ConfigError(anyhow::anyhow!(msg.into()))
}

fn parse_secs(key: &str, value: &str) -> Result<u64, AppError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(config_error(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, value
        ))),
    }
}

/// MONGODB_URI has a development default but must be set explicitly in prod.
fn get_env<F>(
    lookup: &F,
    key: &str,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None if is_prod && key == "MONGODB_URI" => Err(config_error(format!(
            "{} is required in production but not set",
            key
        ))),
        None => default
            .map(str::to_string)
            .ok_or_else(|| config_error(format!("{} is required but not set", key))),
    }
}
