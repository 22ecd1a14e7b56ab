//! Deployment workflow state machine states

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::deployment::EndpointStatus;

/// Serializable state of one deployment attempt
///
/// `Deploying -> Polling -> {Succeeded | Failed | TimedOut}`; `Deploying` may
/// also go straight to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Deploying,
    Polling {
        endpoint_name: String,
        last_status: EndpointStatus,
    },
    Succeeded {
        endpoint_name: String,
    },
    Failed {
        endpoint_name: String,
        reason: String,
    },
    TimedOut {
        endpoint_name: String,
        last_status: EndpointStatus,
        reason: String,
    },
}

/// Terminal result of a deployment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentOutcome {
    Succeeded,
    Failed,
    TimedOut,
}

impl DeploymentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<DeploymentOutcome> {
        match self {
            Self::Deploying | Self::Polling { .. } => None,
            Self::Succeeded { .. } => Some(DeploymentOutcome::Succeeded),
            Self::Failed { .. } => Some(DeploymentOutcome::Failed),
            Self::TimedOut { .. } => Some(DeploymentOutcome::TimedOut),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Deploying => "deploying",
            Self::Polling { .. } => "polling",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::TimedOut { .. } => "timed_out",
        }
    }

    pub fn endpoint_name(&self) -> Option<&str> {
        match self {
            Self::Deploying => None,
            Self::Polling { endpoint_name, .. }
            | Self::Succeeded { endpoint_name }
            | Self::Failed { endpoint_name, .. }
            | Self::TimedOut { endpoint_name, .. } => Some(endpoint_name),
        }
    }

    /// Status string reported on the wire for this state
    pub fn endpoint_status(&self) -> String {
        match self {
            Self::Deploying => "Pending".to_string(),
            Self::Polling { last_status, .. } => last_status.to_string(),
            Self::Succeeded { .. } => EndpointStatus::InService.to_string(),
            Self::Failed { .. } => EndpointStatus::Failed.to_string(),
            Self::TimedOut { .. } => "TimedOut".to_string(),
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } | Self::TimedOut { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
