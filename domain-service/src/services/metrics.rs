//! Metrics collection and Prometheus export.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Where a single-domain read was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Store,
    Fallback,
    Miss,
}

impl LookupSource {
    fn as_str(self) -> &'static str {
        match self {
            LookupSource::Store => "store",
            LookupSource::Fallback => "fallback",
            LookupSource::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Duplicate,
    Failed,
}

impl CreateOutcome {
    fn as_str(self) -> &'static str {
        match self {
            CreateOutcome::Created => "created",
            CreateOutcome::Duplicate => "duplicate",
            CreateOutcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!(
            "failed to install Prometheus recorder: {}",
            e
        ))
    })?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_lookup(source: LookupSource) {
    counter!("domain_lookups_total", "source" => source.as_str()).increment(1);
}

pub fn record_create(outcome: CreateOutcome) {
    counter!("domain_creates_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_store_error(operation: &'static str) {
    counter!("domain_store_errors_total", "operation" => operation).increment(1);
}
