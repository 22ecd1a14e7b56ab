//! Deployment domain entities

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Handle of an approved model package (the package ARN)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelReference(String);

impl ModelReference {
    pub fn new(reference: impl Into<String>) -> Result<Self, DomainError> {
        let reference = reference.into();

        if reference.trim().is_empty() {
            return Err(DomainError::validation("Model reference cannot be empty"));
        }

        Ok(Self(reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ModelReference {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelReference> for String {
    fn from(reference: ModelReference) -> Self {
        reference.0
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to deploy one approved model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub model_reference: ModelReference,
    pub execution_role: String,
    pub instance_type: String,
    pub instance_count: u32,
    pub variant_weight: f32,
    pub variant_name: String,
    pub encryption_key_id: String,
}

/// Platform-side model bound to an execution role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResource {
    pub name: String,
    pub execution_role: String,
    pub model_reference: ModelReference,
}

/// Single production variant of an endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionVariant {
    pub variant_name: String,
    pub model_name: String,
    pub instance_type: String,
    pub initial_instance_count: u32,
    pub initial_variant_weight: f32,
}

/// Immutable descriptor used to (re)provision an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfigResource {
    pub name: String,
    pub production_variant: ProductionVariant,
    pub kms_key_id: String,
}

/// Key/value tag attached to created platform resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Endpoint provisioning status as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointStatus {
    Creating,
    Updating,
    SystemUpdating,
    InService,
    Failed,
    RollingBack,
    Deleting,
    OutOfService,
    UpdateRollbackFailed,
    /// Any status this build does not know about, kept verbatim
    Other(String),
}

/// Semantic bucket of an endpoint status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Pending,
    Succeeded,
    Failed,
}

impl EndpointStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "Creating" => Self::Creating,
            "Updating" => Self::Updating,
            "SystemUpdating" => Self::SystemUpdating,
            "InService" => Self::InService,
            "Failed" => Self::Failed,
            "RollingBack" => Self::RollingBack,
            "Deleting" => Self::Deleting,
            "OutOfService" => Self::OutOfService,
            "UpdateRollbackFailed" => Self::UpdateRollbackFailed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "Creating",
            Self::Updating => "Updating",
            Self::SystemUpdating => "SystemUpdating",
            Self::InService => "InService",
            Self::Failed => "Failed",
            Self::RollingBack => "RollingBack",
            Self::Deleting => "Deleting",
            Self::OutOfService => "OutOfService",
            Self::UpdateRollbackFailed => "UpdateRollbackFailed",
            Self::Other(value) => value,
        }
    }

    /// Only `InService` and `Failed` are terminal; everything else keeps polling
    pub fn class(&self) -> StatusClass {
        match self {
            Self::InService => StatusClass::Succeeded,
            Self::Failed => StatusClass::Failed,
            _ => StatusClass::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class() != StatusClass::Pending
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EndpointStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EndpointStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Live inference endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub status: EndpointStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, status: EndpointStatus) -> Self {
        Self {
            name: name.into(),
            status,
            failure_reason: None,
        }
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_reference_rejects_blank() {
        assert!(ModelReference::new("").is_err());
        assert!(ModelReference::new("   ").is_err());
        assert_eq!(ModelReference::new("arn:x").unwrap().as_str(), "arn:x");
    }

    #[test]
    fn test_model_reference_deserialize_validates() {
        let parsed: Result<ModelReference, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());

        let parsed: ModelReference = serde_json::from_str("\"arn:pkg/1\"").unwrap();
        assert_eq!(parsed.to_string(), "arn:pkg/1");
    }

    #[test]
    fn test_status_buckets() {
        assert_eq!(EndpointStatus::InService.class(), StatusClass::Succeeded);
        assert_eq!(EndpointStatus::Failed.class(), StatusClass::Failed);

        for pending in ["Creating", "Updating", "RollingBack", "Deleting", "OutOfService"] {
            assert_eq!(EndpointStatus::parse(pending).class(), StatusClass::Pending);
        }
    }

    #[test]
    fn test_unknown_status_preserved() {
        let status = EndpointStatus::parse("Provisioning");
        assert_eq!(status, EndpointStatus::Other("Provisioning".to_string()));
        assert_eq!(status.as_str(), "Provisioning");
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_status_serde_as_plain_string() {
        let json = serde_json::to_string(&EndpointStatus::InService).unwrap();
        assert_eq!(json, "\"InService\"");

        let parsed: EndpointStatus = serde_json::from_str("\"RollingBack\"").unwrap();
        assert_eq!(parsed, EndpointStatus::RollingBack);
    }
}
