pub mod domains;
pub mod health;

pub use domains::{create_domain, get_domain, list_domains};
pub use health::{health_check, metrics_endpoint, readiness_check};
