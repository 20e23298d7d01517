#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain_service::config::DomainConfig;
use domain_service::services::{
    CanonicalRecord, ContentStore, ContentStoreError, DomainStore, InMemoryContentStore,
    InMemoryDomainStore, KeyOrNameFilter, StoreError,
};
use domain_service::models::Domain;
use domain_service::{build_router, AppState, Application};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

pub fn test_config() -> DomainConfig {
    // Port 0 binds a random free port
    DomainConfig::from_source(CoreConfig { port: 0 }, |key| match key {
        "DOMAIN_STORE_BACKEND" => Some("memory".to_string()),
        _ => None,
    })
    .expect("Failed to build test configuration")
}

/// Router wired to in-memory gateways, with handles to inspect them.
pub struct TestRouter {
    pub router: Router,
    pub store: Arc<InMemoryDomainStore>,
    pub content_store: Arc<InMemoryContentStore>,
}

impl TestRouter {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryDomainStore::new());
        let content_store = Arc::new(InMemoryContentStore::new());
        let router = build_router(AppState {
            config: test_config(),
            store: store.clone(),
            content_store: content_store.clone(),
        });
        Self {
            router,
            store,
            content_store,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        send(self.router.clone(), request).await
    }
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub fn router_with(store: Arc<dyn DomainStore>, content_store: Arc<dyn ContentStore>) -> Router {
    build_router(AppState {
        config: test_config(),
        store,
        content_store,
    })
}

/// Domain store whose every call times out.
pub struct UnavailableStore;

fn unavailable(operation: &'static str) -> StoreError {
    StoreError::Timeout {
        operation,
        timeout: Duration::from_secs(10),
    }
}

#[async_trait]
impl DomainStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<Domain>, StoreError> {
        Err(unavailable("list"))
    }

    async fn find_by_key_or_name(
        &self,
        _filter: &KeyOrNameFilter,
    ) -> Result<Option<Domain>, StoreError> {
        Err(unavailable("find_by_key_or_name"))
    }

    async fn create(&self, _domain: &Domain) -> Result<String, StoreError> {
        Err(unavailable("create"))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(unavailable("ping"))
    }
}

/// Content store that answers every lookup with the same raw payload.
pub struct FixedContentStore(pub String);

#[async_trait]
impl ContentStore for FixedContentStore {
    async fn lookup(&self, _key: &str) -> Result<Option<String>, ContentStoreError> {
        Ok(Some(self.0.clone()))
    }

    async fn store(&self, _record: &CanonicalRecord) -> Result<(), ContentStoreError> {
        Ok(())
    }
}

/// Service running on a real socket with in-memory gateways.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryDomainStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(InMemoryDomainStore::new());
        let app = Application::build_with(
            test_config(),
            store.clone(),
            Arc::new(InMemoryContentStore::new()),
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
        }
    }
}
