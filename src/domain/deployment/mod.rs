//! Deployment domain - model, endpoint config and endpoint resources

mod entity;
mod naming;
mod platform;
mod settings;

pub use entity::{
    DeploymentRequest, Endpoint, EndpointConfigResource, EndpointStatus, ModelReference,
    ModelResource, ProductionVariant, ResourceTag, StatusClass,
};
pub use naming::{
    validate_resource_name, Clock, ManualClock, ResourceNamer, SystemClock,
    MAX_RESOURCE_NAME_LENGTH,
};
pub use platform::{ModelHostingPlatform, PlatformError};
pub use settings::DeploymentSettings;

#[cfg(test)]
pub use platform::MockModelHostingPlatform;
