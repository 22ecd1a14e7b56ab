//! Prometheus metrics

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsConfig;
use crate::domain::deployment::EndpointStatus;
use crate::domain::execution::DeploymentOutcome;

static EXECUTION_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"dep-[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

/// Prometheus handle backing the metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("model_deploy_orchestrator_info", "version" => env!("CARGO_PKG_VERSION"))
                .set(1.0);

            tracing::info!(path = %config.path, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_deployment_started() {
    counter!("deployments_started_total").increment(1);
}

pub fn record_deployment_finished(outcome: DeploymentOutcome) {
    counter!("deployments_finished_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_status_poll(status: &EndpointStatus) {
    counter!("endpoint_status_polls_total", "status" => status.as_str().to_string()).increment(1);
}

pub fn record_approval_event(decision: &'static str) {
    counter!("approval_events_total", "decision" => decision).increment(1);
}

/// Collapse execution ids so label cardinality stays bounded
fn sanitize_path(path: &str) -> String {
    EXECUTION_ID_PATTERN.replace_all(path, "{id}").to_string()
}
