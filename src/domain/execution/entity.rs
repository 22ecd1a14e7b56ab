//! Deployment workflow execution entity

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::payload::{StepPayload, STATUS_CODE_ERROR, STATUS_CODE_OK, UNKNOWN_ENDPOINT};
use super::state::WorkflowState;
use crate::domain::deployment::ModelReference;
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Regex pattern for valid execution IDs: dep-{uuid}
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^dep-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$").unwrap()
});

/// Validated execution identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if !ID_PATTERN.is_match(&id) {
            return Err(DomainError::invalid_id(format!(
                "Invalid execution ID '{}': must be in format dep-{{uuid}}",
                id
            )));
        }

        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(format!("dep-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExecutionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExecutionId> for String {
    fn from(id: ExecutionId) -> Self {
        id.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for ExecutionId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// One deployment attempt, checkpointed between orchestrator steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecution {
    id: ExecutionId,
    model_reference: ModelReference,
    state: WorkflowState,
    poll_count: u32,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// When the scheduler should run the next step; `None` once terminal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_step_at: Option<DateTime<Utc>>,
    elapsed_secs: i64,
}

impl StorageEntity for WorkflowExecution {
    type Key = ExecutionId;

    fn key(&self) -> &Self::Key {
        &self.id
    }

    fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl WorkflowExecution {
    /// New attempt in the `Deploying` state, due immediately
    pub fn new(model_reference: ModelReference, now: DateTime<Utc>) -> Self {
        Self {
            id: ExecutionId::generate(),
            model_reference,
            state: WorkflowState::Deploying,
            poll_count: 0,
            started_at: now,
            updated_at: now,
            next_step_at: Some(now),
            elapsed_secs: 0,
        }
    }

    pub fn id(&self) -> &ExecutionId {
        &self.id
    }

    pub fn model_reference(&self) -> &ModelReference {
        &self.model_reference
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn next_step_at(&self) -> Option<DateTime<Utc>> {
        self.next_step_at
    }

    /// Wall-clock time spent as of the last transition
    pub fn elapsed_time(&self) -> Duration {
        Duration::seconds(self.elapsed_secs)
    }

    pub fn elapsed_since_start(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_step_at.is_some_and(|at| at <= now)
    }

    pub fn current_endpoint_name(&self) -> Option<&str> {
        self.state.endpoint_name()
    }

    pub fn current_status(&self) -> String {
        self.state.endpoint_status()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.state.failure_reason()
    }

    /// Move to a new state; terminal states clear the schedule
    pub fn transition(&mut self, state: WorkflowState, now: DateTime<Utc>) {
        self.state = state;
        self.updated_at = now;
        self.elapsed_secs = (now - self.started_at).num_seconds();

        if self.state.is_terminal() {
            self.next_step_at = None;
        }
    }

    pub fn schedule_next(&mut self, at: DateTime<Utc>) {
        if !self.state.is_terminal() {
            self.next_step_at = Some(at);
        }
    }

    pub fn record_poll(&mut self) {
        self.poll_count += 1;
    }

    /// Wire payload describing the current state
    pub fn payload(&self) -> StepPayload {
        let endpoint_name = self
            .current_endpoint_name()
            .unwrap_or(UNKNOWN_ENDPOINT)
            .to_string();

        let status_code = match self.state {
            WorkflowState::Failed { .. } | WorkflowState::TimedOut { .. } => STATUS_CODE_ERROR,
            _ => STATUS_CODE_OK,
        };

        StepPayload {
            status_code,
            endpoint_name,
            endpoint_status: self.current_status(),
            failure_reason: self.failure_reason().unwrap_or_default().to_string(),
        }
    }
}
