//! Amazon SageMaker adapter for the hosting-platform port

use std::fmt::Debug;

use async_trait::async_trait;
use aws_sdk_sagemaker::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sagemaker::types::{
    ContainerDefinition, ProductionVariant as SdkProductionVariant, ProductionVariantInstanceType,
    Tag,
};
use aws_sdk_sagemaker::Client as SageMakerClient;
use tracing::debug;

use crate::domain::deployment::{
    Endpoint, EndpointConfigResource, EndpointStatus, ModelHostingPlatform, ModelResource,
    PlatformError, ResourceTag,
};

/// Message fragment SageMaker uses for missing endpoints (ValidationException)
const ENDPOINT_NOT_FOUND_MESSAGE: &str = "Could not find endpoint";

/// SageMaker-backed platform
pub struct SageMakerPlatform {
    client: SageMakerClient,
}

impl Debug for SageMakerPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SageMakerPlatform").finish_non_exhaustive()
    }
}

impl SageMakerPlatform {
    /// Loads AWS configuration from the default provider chain, optionally pinning the region
    pub async fn new(region: Option<&str>) -> Self {
        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        let aws_config = match region {
            Some(region) => {
                loader
                    .region(aws_config::Region::new(region.to_string()))
                    .load()
                    .await
            }
            None => loader.load().await,
        };

        Self::with_config(&aws_config)
    }

    pub fn with_config(aws_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: SageMakerClient::new(aws_config),
        }
    }
}

fn sdk_tags(tags: &[ResourceTag]) -> Option<Vec<Tag>> {
    if tags.is_empty() {
        return None;
    }

    Some(
        tags.iter()
            .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect(),
    )
}

/// Maps a platform answer to the error taxonomy used by the deployment core
fn classify(
    operation: &str,
    endpoint: Option<&str>,
    code: Option<&str>,
    message: Option<&str>,
) -> PlatformError {
    let message = message.unwrap_or("no error message returned");

    match endpoint {
        Some(endpoint) if message.contains(ENDPOINT_NOT_FOUND_MESSAGE) => {
            PlatformError::endpoint_not_found(endpoint)
        }
        _ => PlatformError::api(operation, code.map(str::to_string), message),
    }
}

fn map_sdk_error<E, R>(operation: &str, endpoint: Option<&str>, err: SdkError<E, R>) -> PlatformError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(service) => {
            let service_err = service.err();
            classify(operation, endpoint, service_err.code(), service_err.message())
        }
        _ => PlatformError::transport(operation, DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait]
impl ModelHostingPlatform for SageMakerPlatform {
    async fn create_model(
        &self,
        model: &ModelResource,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError> {
        const OPERATION: &str = "CreateModel";

        let container = ContainerDefinition::builder()
            .model_package_name(model.model_reference.as_str())
            .build();

        self.client
            .create_model()
            .model_name(&model.name)
            .execution_role_arn(&model.execution_role)
            .primary_container(container)
            .set_tags(sdk_tags(tags))
            .send()
            .await
            .map_err(|e| map_sdk_error(OPERATION, None, e))?;

        debug!(model = %model.name, "SageMaker model created");
        Ok(())
    }

    async fn create_endpoint_config(
        &self,
        config: &EndpointConfigResource,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError> {
        const OPERATION: &str = "CreateEndpointConfig";

        let variant = &config.production_variant;
        let production_variant = SdkProductionVariant::builder()
            .variant_name(&variant.variant_name)
            .model_name(&variant.model_name)
            .instance_type(ProductionVariantInstanceType::from(
                variant.instance_type.as_str(),
            ))
            .initial_instance_count(variant.initial_instance_count as i32)
            .initial_variant_weight(variant.initial_variant_weight)
            .build();

        self.client
            .create_endpoint_config()
            .endpoint_config_name(&config.name)
            .production_variants(production_variant)
            .kms_key_id(&config.kms_key_id)
            .set_tags(sdk_tags(tags))
            .send()
            .await
            .map_err(|e| map_sdk_error(OPERATION, None, e))?;

        debug!(endpoint_config = %config.name, "SageMaker endpoint config created");
        Ok(())
    }

    async fn create_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError> {
        const OPERATION: &str = "CreateEndpoint";

        self.client
            .create_endpoint()
            .endpoint_name(endpoint_name)
            .endpoint_config_name(endpoint_config_name)
            .set_tags(sdk_tags(tags))
            .send()
            .await
            .map_err(|e| map_sdk_error(OPERATION, None, e))?;

        Ok(())
    }

    async fn update_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
    ) -> Result<(), PlatformError> {
        self.client
            .update_endpoint()
            .endpoint_name(endpoint_name)
            .endpoint_config_name(endpoint_config_name)
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateEndpoint", Some(endpoint_name), e))?;

        Ok(())
    }

    async fn describe_endpoint(&self, endpoint_name: &str) -> Result<Endpoint, PlatformError> {
        let output = self
            .client
            .describe_endpoint()
            .endpoint_name(endpoint_name)
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeEndpoint", Some(endpoint_name), e))?;

        let status = output
            .endpoint_status()
            .map(|status| EndpointStatus::parse(status.as_str()))
            .unwrap_or_else(|| EndpointStatus::Other("Unknown".to_string()));

        let endpoint = Endpoint::new(output.endpoint_name().unwrap_or(endpoint_name), status);

        Ok(match output.failure_reason() {
            Some(reason) if !reason.is_empty() => endpoint.with_failure_reason(reason),
            _ => endpoint,
        })
    }
}
