//! Managed model-hosting platform port

use async_trait::async_trait;
use thiserror::Error;

use super::entity::{Endpoint, EndpointConfigResource, ModelResource, ResourceTag};

#[cfg(test)]
use mockall::automock;

/// Failure of a single remote platform call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The named endpoint does not exist on the platform
    #[error("Could not find endpoint \"{endpoint}\"")]
    EndpointNotFound { endpoint: String },

    /// The platform answered with an error
    #[error("{operation} failed{}: {message}", .code.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default())]
    Api {
        operation: String,
        code: Option<String>,
        message: String,
    },

    /// The call never got a platform answer (network, timeout, credentials)
    #[error("{operation} could not reach the platform: {message}")]
    Transport { operation: String, message: String },
}

impl PlatformError {
    pub fn endpoint_not_found(endpoint: impl Into<String>) -> Self {
        Self::EndpointNotFound {
            endpoint: endpoint.into(),
        }
    }

    pub fn api(
        operation: impl Into<String>,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            operation: operation.into(),
            code,
            message: message.into(),
        }
    }

    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_endpoint_not_found(&self) -> bool {
        matches!(self, Self::EndpointNotFound { .. })
    }
}

/// Remote operations the deployment core needs from the hosting platform
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModelHostingPlatform: Send + Sync {
    async fn create_model(
        &self,
        model: &ModelResource,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError>;

    async fn create_endpoint_config(
        &self,
        config: &EndpointConfigResource,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError>;

    async fn create_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError>;

    /// Point an existing endpoint at a new configuration
    ///
    /// Must return [`PlatformError::EndpointNotFound`] when the endpoint does not exist.
    async fn update_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
    ) -> Result<(), PlatformError>;

    async fn describe_endpoint(&self, endpoint_name: &str) -> Result<Endpoint, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlatformError::endpoint_not_found("ep-1");
        assert_eq!(err.to_string(), "Could not find endpoint \"ep-1\"");
        assert!(err.is_endpoint_not_found());

        let err = PlatformError::api(
            "UpdateEndpoint",
            Some("ValidationException".to_string()),
            "bad config",
        );
        assert_eq!(
            err.to_string(),
            "UpdateEndpoint failed (ValidationException): bad config"
        );
        assert!(!err.is_endpoint_not_found());

        let err = PlatformError::api("CreateModel", None, "denied");
        assert_eq!(err.to_string(), "CreateModel failed: denied");
    }

    #[test]
    fn test_transport_error_display() {
        let err = PlatformError::transport("DescribeEndpoint", "connection reset");
        assert_eq!(
            err.to_string(),
            "DescribeEndpoint could not reach the platform: connection reset"
        );
    }
}
