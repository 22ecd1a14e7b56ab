//! Workflow execution domain - checkpointed deployment attempts

mod entity;
mod payload;
mod policy;
mod state;

pub use entity::{ExecutionId, WorkflowExecution};
pub use payload::{
    StepInput, StepPayload, SKIPPED_REASON, SKIPPED_STATUS, STATUS_CODE_ERROR, STATUS_CODE_OK,
    UNKNOWN_ENDPOINT,
};
pub use policy::{
    PollingPolicy, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS, MAX_POLICY_SECS,
};
pub use state::{DeploymentOutcome, WorkflowState};
