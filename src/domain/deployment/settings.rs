//! Deployment configuration snapshot

use std::collections::BTreeMap;

use serde::Deserialize;

use super::entity::{DeploymentRequest, ModelReference, ResourceTag};
use super::naming::validate_resource_name;
use crate::domain::DomainError;

/// Maximum characters taken from each part of a derived endpoint name
const ENDPOINT_NAME_PART_LENGTH: usize = 20;

/// Configuration supplied at deployment time
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    pub model_package_group_name: String,
    /// SageMaker project, only used for the `sagemaker:project-name` tag
    pub project_name: String,
    pub datazone_domain: String,
    /// Middle part of the derived endpoint name
    pub datazone_project: String,
    pub scope_name: String,
    /// Overrides the derived endpoint name when set
    pub endpoint_name: Option<String>,
    pub execution_role_arn: String,
    pub kms_key_id: String,
    pub instance_type: String,
    pub initial_instance_count: u32,
    pub initial_variant_weight: f32,
    pub variant_name: String,
    pub tags: BTreeMap<String, String>,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            model_package_group_name: String::new(),
            project_name: String::new(),
            datazone_domain: String::new(),
            datazone_project: String::new(),
            scope_name: String::new(),
            endpoint_name: None,
            execution_role_arn: String::new(),
            kms_key_id: String::new(),
            instance_type: "ml.m5.large".to_string(),
            initial_instance_count: 1,
            initial_variant_weight: 1.0,
            variant_name: "AllTraffic".to_string(),
            tags: BTreeMap::new(),
        }
    }
}

impl DeploymentSettings {
    /// Check that every required value is present, reporting all gaps at once
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("model_package_group_name", &self.model_package_group_name),
            ("execution_role_arn", &self.execution_role_arn),
            ("kms_key_id", &self.kms_key_id),
            ("instance_type", &self.instance_type),
            ("variant_name", &self.variant_name),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "Missing required deployment configuration values: {}",
                missing.join(", ")
            )));
        }

        if self.initial_instance_count == 0 {
            return Err(DomainError::validation(
                "initial_instance_count must be at least 1",
            ));
        }

        if !self.initial_variant_weight.is_finite() || self.initial_variant_weight < 0.0 {
            return Err(DomainError::validation(format!(
                "initial_variant_weight must be a non-negative number, got {}",
                self.initial_variant_weight
            )));
        }

        validate_resource_name(&self.endpoint_name())
    }

    /// Stable endpoint name targeted by every deployment of this configuration
    pub fn endpoint_name(&self) -> String {
        if let Some(name) = self.endpoint_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }

        [
            &self.model_package_group_name,
            &self.datazone_project,
            &self.scope_name,
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.chars().take(ENDPOINT_NAME_PART_LENGTH).collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
    }

    /// Build the immutable request for one approved model
    pub fn to_request(&self, model_reference: ModelReference) -> DeploymentRequest {
        DeploymentRequest {
            model_reference,
            execution_role: self.execution_role_arn.clone(),
            instance_type: self.instance_type.clone(),
            instance_count: self.initial_instance_count,
            variant_weight: self.initial_variant_weight,
            variant_name: self.variant_name.clone(),
            encryption_key_id: self.kms_key_id.clone(),
        }
    }

    /// Tags applied to every resource this configuration creates
    pub fn resource_tags(&self) -> Vec<ResourceTag> {
        let mut tags: BTreeMap<String, String> = BTreeMap::new();

        let derived = [
            ("sagemaker:project-name", &self.project_name),
            ("AmazonDataZoneDomain", &self.datazone_domain),
            ("AmazonDataZoneProject", &self.datazone_project),
            ("AmazonDataZoneScopeName", &self.scope_name),
        ];

        for (key, value) in derived {
            if !value.is_empty() {
                tags.insert(key.to_string(), value.clone());
            }
        }

        // explicit tags win over derived ones
        for (key, value) in &self.tags {
            tags.insert(key.clone(), value.clone());
        }

        tags.into_iter()
            .map(|(key, value)| ResourceTag::new(key, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_settings() -> DeploymentSettings {
        DeploymentSettings {
            model_package_group_name: "abalone-models".to_string(),
            project_name: "marketing".to_string(),
            datazone_domain: "dzd_1".to_string(),
            datazone_project: "aqaa5f".to_string(),
            scope_name: "dev".to_string(),
            execution_role_arn: "arn:aws:iam::123:role/exec".to_string(),
            kms_key_id: "key-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_complete() {
        assert!(complete_settings().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_all_missing_values() {
        let err = DeploymentSettings::default().validate().unwrap_err();
        let message = err.to_string();

        assert!(message.contains("model_package_group_name"));
        assert!(message.contains("execution_role_arn"));
        assert!(message.contains("kms_key_id"));
        assert!(!message.contains("instance_type"));
    }

    #[test]
    fn test_validate_instance_count() {
        let settings = DeploymentSettings {
            initial_instance_count: 0,
            ..complete_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_variant_weight() {
        let settings = DeploymentSettings {
            initial_variant_weight: -1.0,
            ..complete_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_endpoint_name_derived_and_truncated() {
        let settings = DeploymentSettings {
            model_package_group_name: "a-very-long-model-package-group".to_string(),
            datazone_project: "project-identifier-that-is-long".to_string(),
            scope_name: "dev".to_string(),
            ..complete_settings()
        };

        assert_eq!(
            settings.endpoint_name(),
            "a-very-long-model-pa-project-identifier-t-dev"
        );
    }

    #[test]
    fn test_endpoint_name_skips_empty_parts() {
        let settings = DeploymentSettings {
            datazone_project: String::new(),
            ..complete_settings()
        };
        assert_eq!(settings.endpoint_name(), "abalone-models-dev");
    }

    #[test]
    fn test_endpoint_name_override() {
        let settings = DeploymentSettings {
            endpoint_name: Some("prod-endpoint".to_string()),
            ..complete_settings()
        };
        assert_eq!(settings.endpoint_name(), "prod-endpoint");
    }

    #[test]
    fn test_to_request_copies_snapshot() {
        let settings = complete_settings();
        let request = settings.to_request(ModelReference::new("arn:x").unwrap());

        assert_eq!(request.model_reference.as_str(), "arn:x");
        assert_eq!(request.execution_role, "arn:aws:iam::123:role/exec");
        assert_eq!(request.instance_type, "ml.m5.large");
        assert_eq!(request.instance_count, 1);
        assert_eq!(request.variant_name, "AllTraffic");
        assert_eq!(request.encryption_key_id, "key-1");
    }

    #[test]
    fn test_resource_tags_explicit_override() {
        let mut settings = complete_settings();
        settings
            .tags
            .insert("AmazonDataZoneScopeName".to_string(), "prod".to_string());
        settings.tags.insert("team".to_string(), "ml".to_string());

        let tags = settings.resource_tags();

        assert!(tags.contains(&ResourceTag::new("AmazonDataZoneScopeName", "prod")));
        assert!(tags.contains(&ResourceTag::new("sagemaker:project-name", "marketing")));
        assert!(tags.contains(&ResourceTag::new("team", "ml")));
        assert_eq!(tags.len(), 6);
    }

    #[test]
    fn test_resource_tags_separate_project_values() {
        let tags = complete_settings().resource_tags();

        assert!(tags.contains(&ResourceTag::new("sagemaker:project-name", "marketing")));
        assert!(tags.contains(&ResourceTag::new("AmazonDataZoneProject", "aqaa5f")));
        assert!(tags.contains(&ResourceTag::new("AmazonDataZoneDomain", "dzd_1")));
        assert_eq!(complete_settings().endpoint_name(), "abalone-models-aqaa5f-dev");
    }

    #[test]
    fn test_validate_rejects_invalid_endpoint_name() {
        let settings = DeploymentSettings {
            endpoint_name: Some("churn_ep".to_string()),
            ..complete_settings()
        };

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("churn_ep"));
    }

    #[test]
    fn test_validate_rejects_overlong_derived_endpoint_name() {
        let settings = DeploymentSettings {
            model_package_group_name: "g".repeat(20),
            datazone_project: "p".repeat(20),
            scope_name: "s".repeat(30),
            ..complete_settings()
        };

        // 20 + 1 + 20 + 1 + 20 = 62 characters fits
        assert!(settings.validate().is_ok());

        let settings = DeploymentSettings {
            endpoint_name: Some("e".repeat(64)),
            ..complete_settings()
        };
        assert!(settings.validate().is_err());
    }
}
