//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::deployment::DeploymentServiceTrait;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub deployment_service: Arc<dyn DeploymentServiceTrait>,
}

impl AppState {
    pub fn new(deployment_service: Arc<dyn DeploymentServiceTrait>) -> Self {
        Self { deployment_service }
    }
}
