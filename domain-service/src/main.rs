use domain_service::config::DomainConfig;
use domain_service::handlers::health::SERVICE_NAME;
use domain_service::services::init_metrics;
use domain_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Metrics recorder must be installed before any metric is recorded
    init_metrics().map_err(|e| std::io::Error::other(e.to_string()))?;

    let config = DomainConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        SERVICE_NAME,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to get the microservice running: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
