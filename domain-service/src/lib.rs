pub mod config;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use utoipa::OpenApi;

/// Path prefix of the Domain routes.
pub const BASE_PATH: &str = "/msapi";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Domain Microservice",
        description = "RestAPI for the Domain object"
    ),
    paths(
        handlers::health::health_check,
        handlers::domains::list_domains,
        handlers::domains::get_domain,
        handlers::domains::create_domain,
    ),
    tags(
        (name = "domain", description = "Create and retrieve Domains"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

pub use startup::{build_router, AppState, Application};
