//! Content-addressed fallback store.
//!
//! Domains are persisted here as canonical JSON keyed by a content
//! identifier (CID), so a record that is missing from the primary store can
//! still be resolved later.

use crate::models::Domain;
use crate::services::error::ContentStoreError;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, StatusCode, Url};
use serde_json::Value;
use service_core::observability::inject_trace_context;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Prefix naming the digest algorithm of every CID.
pub const CID_PREFIX: &str = "sha256:";

/// Canonical JSON of a Domain's content plus its content identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub cid: String,
    pub json: String,
}

impl CanonicalRecord {
    pub fn from_domain(domain: &Domain) -> Result<Self, ContentStoreError> {
        let mut json = String::new();
        write_canonical(&domain.content()?, &mut json)?;
        let digest = Sha256::digest(json.as_bytes());
        Ok(Self {
            cid: format!("{}{}", CID_PREFIX, hex::encode(digest)),
            json,
        })
    }
}

/// Compact JSON with object members sorted by key at every depth.
fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(members) => {
            let mut entries: Vec<_> = members.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (field, member)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(field)?);
                out.push(':');
                write_canonical(member, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// JSON stored under `key`, or `None` when nothing exists for it.
    async fn lookup(&self, key: &str) -> Result<Option<String>, ContentStoreError>;

    /// Persist a canonical record under its CID. Storing the same record
    /// twice is not an error.
    async fn store(&self, record: &CanonicalRecord) -> Result<(), ContentStoreError>;
}

/// Content store reached over HTTP.
///
/// Objects live at `{base}/objects/{key}`: `GET` returns the JSON (404 when
/// absent) and `PUT` writes it.
pub struct HttpContentStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpContentStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ContentStoreError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ContentStoreError::InvalidBaseUrl(base_url.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        tracing::info!(base_url = %base_url, "Using HTTP content store");
        Ok(Self { client, base_url })
    }

    fn object_url(&self, key: &str) -> Result<Url, ContentStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ContentStoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("objects")
            .push(key);
        Ok(url)
    }

    fn trace_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        headers
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn lookup(&self, key: &str) -> Result<Option<String>, ContentStoreError> {
        let response = self
            .client
            .get(self.object_url(key)?)
            .headers(Self::trace_headers())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            status => Err(ContentStoreError::UnexpectedStatus {
                status,
                key: key.to_string(),
            }),
        }
    }

    async fn store(&self, record: &CanonicalRecord) -> Result<(), ContentStoreError> {
        let response = self
            .client
            .put(self.object_url(&record.cid)?)
            .headers(Self::trace_headers())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(record.json.clone())
            .send()
            .await?;

        match response.status() {
            // Content addressing: an existing object holds the same bytes
            StatusCode::CONFLICT => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(ContentStoreError::UnexpectedStatus {
                status,
                key: record.cid.clone(),
            }),
        }
    }
}
