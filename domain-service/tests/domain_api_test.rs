mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{router_with, send, FixedContentStore, TestRouter, UnavailableStore};
use domain_service::models::Domain;
use domain_service::services::{
    CanonicalRecord, ContentStore, DomainStore, InMemoryContentStore, InMemoryDomainStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Response body is not JSON")
}

#[tokio::test]
async fn list_on_empty_collection_returns_empty_array() {
    let app = TestRouter::new();

    let (status, body) = app.get("/msapi/domain").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn create_echoes_domain_with_content_key() {
    let app = TestRouter::new();

    let (status, body) = app.post_json("/msapi/domain", r#"{"name":"acme"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let created = parse(&body);
    let expected_key = CanonicalRecord::from_domain(&Domain::new("acme"))
        .unwrap()
        .cid;
    assert_eq!(created, json!({"_key": expected_key, "name": "acme"}));
}

#[tokio::test]
async fn created_domain_is_readable_by_name_and_key() {
    let app = TestRouter::new();
    let (_, body) = app.post_json("/msapi/domain", r#"{"name":"acme"}"#).await;
    let created = parse(&body);
    let key = created["_key"].as_str().unwrap();

    let (status, by_name) = app.get("/msapi/domain/acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&by_name), created);

    let (status, by_key) = app.get(&format!("/msapi/domain/{}", key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&by_key), created);
}

#[tokio::test]
async fn unknown_key_returns_empty_domain_with_200() {
    let app = TestRouter::new();

    let (status, body) = app.get("/msapi/domain/nonexistent").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "{}");
}

#[tokio::test]
async fn duplicate_create_is_success_and_stores_once() {
    let app = TestRouter::new();
    let payload = r#"{"name":"acme","owner":{"team":"ops"},"tier":2}"#;

    let (first_status, first) = app.post_json("/msapi/domain", payload).await;
    let (second_status, second) = app.post_json("/msapi/domain", payload).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(parse(&first), parse(&second));
    assert_eq!(app.store.len().await, 1);
    assert_eq!(app.content_store.len().await, 1);
}

#[tokio::test]
async fn member_order_does_not_change_content_key() {
    let app = TestRouter::new();

    let (_, first) = app
        .post_json("/msapi/domain", r#"{"name":"acme","tier":2}"#)
        .await;
    let (_, second) = app
        .post_json("/msapi/domain", r#"{"tier":2,"name":"acme"}"#)
        .await;

    assert_eq!(parse(&first)["_key"], parse(&second)["_key"]);
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn supplied_key_is_kept() {
    let app = TestRouter::new();

    let (status, body) = app
        .post_json("/msapi/domain", r#"{"_key":"acme-prod","name":"acme"}"#)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["_key"], "acme-prod");

    let (_, fetched) = app.get("/msapi/domain/acme-prod").await;
    assert_eq!(parse(&fetched)["name"], "acme");
}

#[tokio::test]
async fn empty_key_is_replaced_by_content_key() {
    let app = TestRouter::new();

    let (_, acme) = app
        .post_json("/msapi/domain", r#"{"_key":"","name":"acme"}"#)
        .await;
    let (_, globex) = app
        .post_json("/msapi/domain", r#"{"_key":"","name":"globex"}"#)
        .await;

    let globex_key = CanonicalRecord::from_domain(&Domain::new("globex"))
        .unwrap()
        .cid;
    assert_eq!(parse(&globex), json!({"_key": globex_key, "name": "globex"}));
    assert_ne!(parse(&acme)["_key"], parse(&globex)["_key"]);

    let (_, listed) = app.get("/msapi/domain").await;
    let names: Vec<Value> = parse(&listed)
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("acme"), json!("globex")]);
}

#[tokio::test]
async fn list_returns_created_domains_in_insertion_order() {
    let app = TestRouter::new();
    app.post_json("/msapi/domain", r#"{"name":"globex"}"#).await;
    app.post_json("/msapi/domain", r#"{"name":"acme"}"#).await;

    let (status, body) = app.get("/msapi/domain").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = parse(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["globex", "acme"]);
}

#[tokio::test]
async fn shared_name_resolves_to_first_match() {
    let app = TestRouter::new();
    app.post_json("/msapi/domain", r#"{"_key":"first","name":"shared"}"#)
        .await;
    app.post_json("/msapi/domain", r#"{"_key":"second","name":"shared"}"#)
        .await;

    let (_, body) = app.get("/msapi/domain/shared").await;

    assert_eq!(parse(&body)["_key"], "first");
}

#[tokio::test]
async fn missing_domain_falls_back_to_content_store() {
    let store = Arc::new(InMemoryDomainStore::new());
    let content_store = Arc::new(InMemoryContentStore::new());
    let legacy = Domain::new("legacy").with_attribute("tier", json!("gold"));
    let record = CanonicalRecord::from_domain(&legacy).unwrap();
    content_store.store(&record).await.unwrap();
    let router = router_with(store, content_store);

    let by_cid = json!({"_key": record.cid, "name": "legacy", "tier": "gold"});
    let by_name = json!({"name": "legacy", "tier": "gold"});
    for (token, expected) in [(record.cid.as_str(), by_cid), ("legacy", by_name)] {
        let (status, body) = send(
            router.clone(),
            Request::builder()
                .uri(format!("/msapi/domain/{}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&body), expected);
    }
}

#[tokio::test]
async fn undecodable_fallback_payload_returns_partial_domain() {
    let router = router_with(
        Arc::new(InMemoryDomainStore::new()),
        Arc::new(FixedContentStore(
            r#"{"_key":"k9","name":["not","a","string"],"tier":"gold"}"#.to_string(),
        )),
    );

    let (status, body) = send(
        router,
        Request::builder()
            .uri("/msapi/domain/k9")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"_key": "k9", "tier": "gold"}));
}

#[tokio::test]
async fn malformed_body_returns_503_with_message() {
    let app = TestRouter::new();

    let (status, body) = app.post_json("/msapi/domain", r#"{"name": "#).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body.is_empty());
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn body_without_json_content_type_returns_503() {
    let app = TestRouter::new();

    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/msapi/domain")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from(r#"{"name":"acme"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn store_failures_are_absorbed() {
    let content_store = Arc::new(InMemoryContentStore::new());
    let router = router_with(Arc::new(UnavailableStore), content_store.clone());

    let (status, body) = send(
        router.clone(),
        Request::builder()
            .uri("/msapi/domain")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");

    let (status, body) = send(
        router.clone(),
        Request::builder()
            .method(Method::POST)
            .uri("/msapi/domain")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"acme"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["name"], "acme");

    // The content store still received the record, so reads fall back to it
    let (status, body) = send(
        router,
        Request::builder()
            .uri("/msapi/domain/acme")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"name": "acme"}));
}

#[tokio::test]
async fn readiness_reflects_store_health() {
    let healthy = TestRouter::new();
    let (status, _) = healthy.get("/ready").await;
    assert_eq!(status, StatusCode::OK);

    let router = router_with(
        Arc::new(UnavailableStore),
        Arc::new(InMemoryContentStore::new()),
    );
    let (status, body) = send(
        router,
        Request::builder().uri("/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse(&body)["error"], "Service unavailable");
}

#[tokio::test]
async fn store_only_sees_keyed_records() {
    let app = TestRouter::new();
    app.post_json("/msapi/domain", r#"{"name":"acme"}"#).await;

    let stored = app.store.list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].key.as_deref().unwrap().starts_with("sha256:"));
}
