//! Model package state-change events

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const STATUS_COMPLETED: &str = "Completed";
pub const APPROVAL_APPROVED: &str = "Approved";

/// Errors raised while reading an inbound approval event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error("Malformed approval event: {0}")]
    Malformed(String),

    #[error("Approval event has no detail")]
    MissingDetail,

    #[error("Approval event detail is missing {0}")]
    MissingField(&'static str),
}

/// Detail block of a model package state-change event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelPackageDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_package_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_approval_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_package_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_package_group_name: Option<String>,
}

impl ModelPackageDetail {
    /// Package finished registering and was approved
    pub fn is_approved_and_completed(&self) -> bool {
        self.model_package_status.as_deref() == Some(STATUS_COMPLETED)
            && self.model_approval_status.as_deref() == Some(APPROVAL_APPROVED)
    }
}

/// Inbound approval event envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        rename = "detail-type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub detail_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ModelPackageDetail>,
}

impl ApprovalEvent {
    /// Parse a raw event, tolerating unknown envelope fields
    pub fn from_value(value: &Value) -> Result<Self, TriggerError> {
        if !value.is_object() {
            return Err(TriggerError::Malformed("event must be a JSON object".to_string()));
        }

        serde_json::from_value(value.clone()).map_err(|e| TriggerError::Malformed(e.to_string()))
    }

    pub fn detail(&self) -> Result<&ModelPackageDetail, TriggerError> {
        self.detail.as_ref().ok_or(TriggerError::MissingDetail)
    }
}
