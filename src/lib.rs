//! Model Deploy Orchestrator
//!
//! Turns model-package approval events into running inference endpoints:
//! - Trigger binding for approved, completed model packages
//! - Model, endpoint config and endpoint provisioning (create or update)
//! - Checkpointed status polling with a time budget
//! - HTTP and CLI entry points

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use domain::deployment::{Clock, ResourceNamer, SystemClock};
use domain::execution::WorkflowExecution;
use infrastructure::deployment::{
    DeploymentExecutor, DeploymentOrchestrator, DeploymentService, StatusProber, TriggerBinding,
};
use infrastructure::platform::{create_platform, PlatformKind};
use infrastructure::storage::{StorageConfig, StorageFactory};

/// Wire the deployment service from configuration
pub async fn create_deployment_service(config: &AppConfig) -> anyhow::Result<Arc<DeploymentService>> {
    let platform_kind: PlatformKind = config.platform.kind.parse()?;
    let platform = create_platform(platform_kind, config.platform.region.as_deref()).await;

    let storage_config = StorageConfig::resolve(
        &config.storage.backend,
        config.storage.database_url.as_deref(),
        &config.storage.table,
    )?;
    let storage = StorageFactory::create::<WorkflowExecution>(&storage_config).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let executor = DeploymentExecutor::new(
        config.deployment.clone(),
        ResourceNamer::new(clock.clone()),
        platform.clone(),
    );

    let orchestrator = DeploymentOrchestrator::new(
        executor,
        StatusProber::new(platform),
        TriggerBinding::new(config.trigger.rule()),
        clock,
        config.workflow.policy(),
    );

    info!(
        platform = ?platform_kind,
        storage = ?storage_config.storage_type(),
        endpoint = %config.deployment.endpoint_name(),
        "Deployment service initialized"
    );

    Ok(Arc::new(DeploymentService::new(Arc::new(orchestrator), storage)))
}

/// Create application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let service = create_deployment_service(config).await?;
    Ok(AppState::new(service))
}
