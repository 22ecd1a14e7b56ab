//! Checkpointed deployment service

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::orchestrator::DeploymentOrchestrator;
use super::prober::ProbeResult;
use super::trigger::TriggerDecision;
use crate::domain::execution::{
    ExecutionId, StepInput, StepPayload, WorkflowExecution, STATUS_CODE_ERROR, UNKNOWN_ENDPOINT,
};
use crate::domain::storage::Storage;
use crate::domain::DomainError;
use crate::infrastructure::metrics::{record_deployment_finished, record_deployment_started};

/// Answer of the trigger entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// Set when an execution was started and checkpointed
    pub execution_id: Option<ExecutionId>,
    pub payload: StepPayload,
}

/// Deployment operations exposed to the API and CLI
#[async_trait]
pub trait DeploymentServiceTrait: Send + Sync + Debug {
    /// Trigger entry point; never fails, failures are in the payload
    async fn handle_event(&self, event: &Value) -> EventOutcome;

    /// Stateless step entry point
    async fn handle_step(&self, input: StepInput) -> StepPayload;

    /// Run one step of a stored execution
    async fn advance(&self, id: &ExecutionId) -> Result<WorkflowExecution, DomainError>;

    /// Advance every execution whose next step is due; returns how many were stepped
    async fn advance_due(&self) -> Result<usize, DomainError>;

    async fn get(&self, id: &ExecutionId) -> Result<WorkflowExecution, DomainError>;

    /// Most recent first
    async fn list(&self) -> Result<Vec<WorkflowExecution>, DomainError>;

    async fn probe(&self, endpoint_name: &str) -> ProbeResult;

    /// Storage reachability
    async fn health_check(&self) -> Result<(), DomainError>;
}

/// Runs orchestrator steps as load, step, save
///
/// An execution is stepped by at most one caller at a time within this
/// process; the scheduler and explicit `advance` calls share the claim set.
#[derive(Debug)]
pub struct DeploymentService {
    orchestrator: Arc<DeploymentOrchestrator>,
    storage: Arc<dyn Storage<WorkflowExecution>>,
    in_flight: Mutex<HashSet<ExecutionId>>,
}

/// Releases the claim on drop
struct StepClaim<'a> {
    in_flight: &'a Mutex<HashSet<ExecutionId>>,
    id: ExecutionId,
}

impl Drop for StepClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

impl DeploymentService {
    pub fn new(
        orchestrator: Arc<DeploymentOrchestrator>,
        storage: Arc<dyn Storage<WorkflowExecution>>,
    ) -> Self {
        Self {
            orchestrator,
            storage,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn orchestrator(&self) -> &DeploymentOrchestrator {
        &self.orchestrator
    }

    /// `None` while another caller is stepping the same execution
    fn claim(&self, id: &ExecutionId) -> Option<StepClaim<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());

        if !in_flight.insert(id.clone()) {
            return None;
        }

        Some(StepClaim {
            in_flight: &self.in_flight,
            id: id.clone(),
        })
    }

    /// Reloads under a claim so a step never runs on a stale checkpoint
    async fn advance_if_due(
        &self,
        id: &ExecutionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let Some(_claim) = self.claim(id) else {
            debug!(execution_id = %id, "Execution already being advanced, skipping");
            return Ok(false);
        };

        let Some(mut execution) = self.storage.get(id).await? else {
            return Ok(false);
        };

        if execution.is_terminal() || !execution.is_due(now) {
            return Ok(false);
        }

        self.step_and_save(&mut execution).await?;
        Ok(true)
    }

    /// Steps in place, then checkpoints; on a save error the caller still
    /// holds the stepped state
    async fn step_and_save(&self, execution: &mut WorkflowExecution) -> Result<(), DomainError> {
        let was_terminal = execution.is_terminal();

        self.orchestrator.step(execution).await;
        self.storage.save(execution.clone()).await?;

        if !was_terminal {
            if let Some(outcome) = execution.state().outcome() {
                record_deployment_finished(outcome);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DeploymentServiceTrait for DeploymentService {
    #[instrument(skip(self, event))]
    async fn handle_event(&self, event: &Value) -> EventOutcome {
        let model_reference = match self.orchestrator.trigger().evaluate(event) {
            TriggerDecision::Deploy(reference) => reference,
            TriggerDecision::Skip { .. } => {
                return EventOutcome {
                    execution_id: None,
                    payload: StepPayload::skipped(),
                };
            }
            TriggerDecision::Invalid(err) => {
                return EventOutcome {
                    execution_id: None,
                    payload: StepPayload::failed(UNKNOWN_ENDPOINT, err.to_string()),
                };
            }
        };

        let mut execution = self.orchestrator.start(model_reference);
        let execution_id = execution.id().clone();
        record_deployment_started();
        info!(execution_id = %execution_id, model_reference = %execution.model_reference(), "Deployment execution started");

        match self.step_and_save(&mut execution).await {
            Ok(()) => EventOutcome {
                execution_id: Some(execution_id),
                payload: execution.payload(),
            },
            Err(err) => {
                error!(execution_id = %execution_id, error = %err, "Failed to checkpoint execution");
                let mut payload = execution.payload();
                let checkpoint_reason = format!("Failed to checkpoint execution: {}", err);
                payload.status_code = STATUS_CODE_ERROR;
                payload.failure_reason = if payload.failure_reason.is_empty() {
                    checkpoint_reason
                } else {
                    format!("{}; {}", payload.failure_reason, checkpoint_reason)
                };
                EventOutcome {
                    execution_id: None,
                    payload,
                }
            }
        }
    }

    async fn handle_step(&self, input: StepInput) -> StepPayload {
        self.orchestrator.handle_step(input).await
    }

    #[instrument(skip(self), fields(execution_id = %id))]
    async fn advance(&self, id: &ExecutionId) -> Result<WorkflowExecution, DomainError> {
        let Some(_claim) = self.claim(id) else {
            return Err(DomainError::conflict(format!(
                "Execution '{}' is already being advanced",
                id
            )));
        };

        let mut execution = self.get(id).await?;

        if execution.is_terminal() {
            return Ok(execution);
        }

        self.step_and_save(&mut execution).await?;
        Ok(execution)
    }

    async fn advance_due(&self) -> Result<usize, DomainError> {
        let now = self.orchestrator.now();
        let due: Vec<ExecutionId> = self
            .storage
            .list_active()
            .await?
            .into_iter()
            .filter(|execution| !execution.is_terminal() && execution.is_due(now))
            .map(|execution| execution.id().clone())
            .collect();

        let results = join_all(due.iter().map(|id| self.advance_if_due(id, now))).await;

        let mut advanced = 0;
        for (id, result) in due.iter().zip(results) {
            match result {
                Ok(true) => advanced += 1,
                Ok(false) => {}
                Err(err) => warn!(execution_id = %id, error = %err, "Failed to advance execution"),
            }
        }

        Ok(advanced)
    }

    async fn get(&self, id: &ExecutionId) -> Result<WorkflowExecution, DomainError> {
        self.storage
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Execution '{}' not found", id)))
    }

    async fn list(&self) -> Result<Vec<WorkflowExecution>, DomainError> {
        let mut executions = self.storage.list().await?;
        executions.sort_by_key(|execution| std::cmp::Reverse(execution.started_at()));
        Ok(executions)
    }

    async fn probe(&self, endpoint_name: &str) -> ProbeResult {
        self.orchestrator.prober().probe(endpoint_name).await
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        self.storage.count().await.map(|_| ())
    }
}
