//! Domain routes.
//!
//! Backend failures are logged and absorbed: every route answers with the
//! best data it has rather than an error status. The only error response is
//! the 503 for an unparseable create body, kept for client compatibility.

use crate::extract::DomainJson;
use crate::models::Domain;
use crate::services::metrics::{
    record_create, record_lookup, record_store_error, CreateOutcome, LookupSource,
};
use crate::services::{CanonicalRecord, KeyOrNameFilter, StoreError, CID_PREFIX};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

/// Get a list of Domains
#[utoipa::path(
    get,
    path = "/msapi/domain",
    responses(
        (status = 200, description = "Every Domain in the store, possibly empty")
    ),
    tag = "domain"
)]
pub async fn list_domains(State(state): State<AppState>) -> Json<Vec<Domain>> {
    match state.store.list().await {
        Ok(domains) => {
            tracing::info!(count = domains.len(), "Listed domains");
            Json(domains)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list domains");
            record_store_error("list");
            Json(Vec::new())
        }
    }
}

/// Get a Domain by `_key` or name
///
/// Falls back to the content store when the primary store has no match. A
/// miss in both answers 200 with an empty Domain.
#[utoipa::path(
    get,
    path = "/msapi/domain/{key}",
    params(
        ("key" = String, Path, description = "Domain _key, name or content identifier")
    ),
    responses(
        (status = 200, description = "The Domain, or `{}` when nothing matches")
    ),
    tag = "domain"
)]
pub async fn get_domain(State(state): State<AppState>, Path(key): Path<String>) -> Json<Domain> {
    match state
        .store
        .find_by_key_or_name(&KeyOrNameFilter::new(key.as_str()))
        .await
    {
        Ok(Some(domain)) => {
            tracing::info!(key = %key, stored_key = ?domain.key, "Got domain from store");
            record_lookup(LookupSource::Store);
            return Json(domain);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to query domain");
            record_store_error("find_by_key_or_name");
        }
    }

    let domain = match state.content_store.lookup(&key).await {
        Ok(Some(json)) => {
            let (mut domain, err) = Domain::from_json_lossy(&json);
            if let Some(err) = err {
                tracing::error!(
                    key = %key,
                    error = %err,
                    "Failed to decode domain from content store"
                );
            }
            // Content records carry no key; a CID token is the key they were stored under
            if domain.key.is_none() && key.starts_with(CID_PREFIX) {
                domain.key = Some(key.clone());
            }
            record_lookup(LookupSource::Fallback);
            domain
        }
        Ok(None) => {
            tracing::info!(key = %key, "Domain not found in store or content store");
            record_lookup(LookupSource::Miss);
            Domain::default()
        }
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Content store lookup failed");
            record_lookup(LookupSource::Miss);
            Domain::default()
        }
    };

    Json(domain)
}

/// Create a Domain and persist it
///
/// A Domain without `_key` is keyed by its content identifier, so posting the
/// same content twice lands on the same record. The submitted Domain is
/// echoed back with its key.
#[utoipa::path(
    post,
    path = "/msapi/domain",
    responses(
        (status = 200, description = "The Domain as submitted, with its `_key`"),
        (status = 503, description = "Body is not a JSON Domain; plain-text parse error")
    ),
    tag = "domain"
)]
pub async fn create_domain(
    State(state): State<AppState>,
    DomainJson(mut domain): DomainJson<Domain>,
) -> Result<Response, AppError> {
    let record = CanonicalRecord::from_domain(&domain)?;
    tracing::info!(cid = %record.cid, json = %record.json, "Canonicalized domain");

    if let Err(e) = state.content_store.store(&record).await {
        tracing::error!(
            cid = %record.cid,
            error = %e,
            "Failed to persist domain to content store"
        );
    }

    if domain.key.as_deref().map_or(true, str::is_empty) {
        domain.key = Some(record.cid.clone());
    }

    // A conflict means the same key, and for content keys the same content, is already stored
    match state.store.create(&domain).await {
        Ok(key) => {
            tracing::info!(key = %key, "Created domain");
            record_create(CreateOutcome::Created);
            domain.key = Some(key);
        }
        Err(StoreError::Conflict(key)) => {
            tracing::info!(key = %key, "Domain already exists");
            record_create(CreateOutcome::Duplicate);
        }
        Err(e) => {
            tracing::error!(key = ?domain.key, error = %e, "Failed to create domain");
            record_store_error("create");
            record_create(CreateOutcome::Failed);
        }
    }

    Ok(Json(domain).into_response())
}
