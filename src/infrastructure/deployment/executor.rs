//! One-shot deployment of an approved model

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::deployment::{
    validate_resource_name, DeploymentRequest, DeploymentSettings, EndpointConfigResource,
    EndpointStatus, ModelHostingPlatform, ModelReference, ModelResource, PlatformError,
    ProductionVariant, ResourceNamer, ResourceTag,
};
use crate::domain::execution::UNKNOWN_ENDPOINT;
use crate::domain::DomainError;

/// Outcome of [`DeploymentExecutor::deploy`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub endpoint_name: String,
    pub status: EndpointStatus,
    pub failure_reason: String,
}

impl DeploymentResult {
    pub fn failed(endpoint_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            status: EndpointStatus::Failed,
            failure_reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == EndpointStatus::Failed
    }
}

/// Creates the model, the endpoint config and then creates or updates the endpoint
pub struct DeploymentExecutor {
    settings: DeploymentSettings,
    namer: ResourceNamer,
    platform: Arc<dyn ModelHostingPlatform>,
}

impl std::fmt::Debug for DeploymentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentExecutor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl DeploymentExecutor {
    pub fn new(
        settings: DeploymentSettings,
        namer: ResourceNamer,
        platform: Arc<dyn ModelHostingPlatform>,
    ) -> Self {
        Self {
            settings,
            namer,
            platform,
        }
    }

    pub fn settings(&self) -> &DeploymentSettings {
        &self.settings
    }

    /// Deterministic target of every deployment
    pub fn endpoint_name(&self) -> String {
        self.settings.endpoint_name()
    }

    /// Validates the configuration snapshot and binds it to the model
    pub fn build_request(
        &self,
        model_reference: ModelReference,
    ) -> Result<DeploymentRequest, DomainError> {
        self.settings.validate()?;
        Ok(self.settings.to_request(model_reference))
    }

    /// Never fails past its boundary: every error becomes a `Failed` result
    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        let group = &self.settings.model_package_group_name;
        let tags = self.settings.resource_tags();

        // checked before any platform call so a bad name leaves nothing behind
        let endpoint_name = self.endpoint_name();
        if let Err(err) = validate_resource_name(&endpoint_name) {
            return DeploymentResult::failed(UNKNOWN_ENDPOINT, err.to_string());
        }

        let model = match self.namer.model_name(group) {
            Ok(name) => ModelResource {
                name,
                execution_role: request.execution_role.clone(),
                model_reference: request.model_reference.clone(),
            },
            Err(err) => return DeploymentResult::failed(UNKNOWN_ENDPOINT, err.to_string()),
        };

        if let Err(err) = self.platform.create_model(&model, &tags).await {
            warn!(model = %model.name, error = %err, "Model creation failed");
            return DeploymentResult::failed(UNKNOWN_ENDPOINT, err.to_string());
        }
        info!(model = %model.name, model_reference = %request.model_reference, "Model created");

        let config = match self.namer.endpoint_config_name(group) {
            Ok(name) => EndpointConfigResource {
                name,
                production_variant: ProductionVariant {
                    variant_name: request.variant_name.clone(),
                    model_name: model.name.clone(),
                    instance_type: request.instance_type.clone(),
                    initial_instance_count: request.instance_count,
                    initial_variant_weight: request.variant_weight,
                },
                kms_key_id: request.encryption_key_id.clone(),
            },
            Err(err) => return DeploymentResult::failed(UNKNOWN_ENDPOINT, err.to_string()),
        };

        if let Err(err) = self.platform.create_endpoint_config(&config, &tags).await {
            warn!(endpoint_config = %config.name, error = %err, "Endpoint config creation failed");
            return DeploymentResult::failed(UNKNOWN_ENDPOINT, err.to_string());
        }
        info!(endpoint_config = %config.name, "Endpoint config created");

        match self
            .create_or_update_endpoint(&endpoint_name, &config.name, &tags)
            .await
        {
            Ok(status) => DeploymentResult {
                endpoint_name,
                status,
                failure_reason: String::new(),
            },
            Err(err) => {
                warn!(endpoint = %endpoint_name, error = %err, "Endpoint deployment failed");
                DeploymentResult::failed(endpoint_name, err.to_string())
            }
        }
    }

    /// Update in place; create only when the platform says the endpoint does not exist
    pub async fn create_or_update_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
        tags: &[ResourceTag],
    ) -> Result<EndpointStatus, PlatformError> {
        match self
            .platform
            .update_endpoint(endpoint_name, endpoint_config_name)
            .await
        {
            Ok(()) => {
                info!(endpoint = %endpoint_name, endpoint_config = %endpoint_config_name, "Endpoint update started");
                Ok(EndpointStatus::Updating)
            }
            Err(err) if err.is_endpoint_not_found() => {
                self.platform
                    .create_endpoint(endpoint_name, endpoint_config_name, tags)
                    .await?;
                info!(endpoint = %endpoint_name, endpoint_config = %endpoint_config_name, "Endpoint creation started");
                Ok(EndpointStatus::Creating)
            }
            Err(err) => Err(err),
        }
    }
}
