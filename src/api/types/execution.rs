//! Execution inspection responses

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::execution::{StepPayload, WorkflowExecution, WorkflowState};

/// One deployment attempt as seen through the API
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResponse {
    pub id: String,
    pub model_reference: String,
    pub state: WorkflowState,
    pub poll_count: u32,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step_at: Option<DateTime<Utc>>,
    pub elapsed_secs: i64,
    pub result: StepPayload,
}

impl From<&WorkflowExecution> for ExecutionResponse {
    fn from(execution: &WorkflowExecution) -> Self {
        Self {
            id: execution.id().to_string(),
            model_reference: execution.model_reference().to_string(),
            state: execution.state().clone(),
            poll_count: execution.poll_count(),
            started_at: execution.started_at(),
            updated_at: execution.updated_at(),
            next_step_at: execution.next_step_at(),
            elapsed_secs: execution.elapsed_time().num_seconds(),
            result: execution.payload(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionsListResponse {
    pub object: &'static str,
    pub data: Vec<ExecutionResponse>,
}

impl ExecutionsListResponse {
    pub fn new(executions: &[WorkflowExecution]) -> Self {
        Self {
            object: "list",
            data: executions.iter().map(ExecutionResponse::from).collect(),
        }
    }
}
