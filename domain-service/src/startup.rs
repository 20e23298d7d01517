use crate::config::{ContentStoreBackend, DomainConfig, StoreBackend};
use crate::handlers;
use crate::services::{
    ContentStore, DomainStore, HttpContentStore, InMemoryContentStore, InMemoryDomainStore,
    MongoDb,
};
use crate::{ApiDoc, BASE_PATH};
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Dependencies shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: DomainConfig,
    pub store: Arc<dyn DomainStore>,
    pub content_store: Arc<dyn ContentStore>,
}

pub fn build_router(state: AppState) -> Router {
    let domain_routes = Router::new()
        .route(
            "/domain",
            get(handlers::list_domains).post(handlers::create_domain),
        )
        .route("/domain/:key", get(handlers::get_domain));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest(BASE_PATH, domain_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
}

async fn connect_store(config: &DomainConfig) -> Result<Arc<dyn DomainStore>, AppError> {
    match config.store.backend {
        StoreBackend::Mongo => {
            let db = MongoDb::connect(
                &config.mongodb.uri,
                &config.mongodb.database,
                &config.mongodb.collection,
                config.store.timeout(),
            )
            .await?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory domain store; records are lost on shutdown");
            Ok(Arc::new(InMemoryDomainStore::new()))
        }
    }
}

fn build_content_store(config: &DomainConfig) -> Result<Arc<dyn ContentStore>, AppError> {
    match (config.content_store.backend, config.content_store.url.as_deref()) {
        (ContentStoreBackend::Http, Some(url)) => Ok(Arc::new(HttpContentStore::new(
            url,
            config.content_store.timeout(),
        )?)),
        (ContentStoreBackend::Http, None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "CONTENT_STORE_URL is required for the http content store"
        ))),
        (ContentStoreBackend::Memory, _) => {
            tracing::info!("Using in-memory content store");
            Ok(Arc::new(InMemoryContentStore::new()))
        }
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: DomainConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        let content_store = build_content_store(&config)?;
        Self::build_with(config, store, content_store).await
    }

    /// Serve with the given gateways instead of the configured ones.
    pub async fn build_with(
        config: DomainConfig,
        store: Arc<dyn DomainStore>,
        content_store: Arc<dyn ContentStore>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            config: config.clone(),
            store,
            content_store,
        };

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
