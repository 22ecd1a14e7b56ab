//! Deployment state machine
//!
//! Each call to [`DeploymentOrchestrator::step`] performs exactly one unit of
//! work (the deploy, or one status probe) and leaves the execution in a state
//! that can be checkpointed and resumed later.

use std::sync::Arc;

use tracing::{info, warn};

use super::executor::DeploymentExecutor;
use super::prober::StatusProber;
use super::trigger::{TriggerBinding, TriggerDecision};
use crate::domain::deployment::{Clock, EndpointStatus, ModelReference, StatusClass};
use crate::domain::execution::{
    PollingPolicy, StepInput, StepPayload, WorkflowExecution, WorkflowState, UNKNOWN_ENDPOINT,
};

pub const MISSING_STEP_INPUT_REASON: &str = "No endpoint name or event detail in step input";

/// Drives executions through `Deploying -> Polling -> terminal`
#[derive(Debug)]
pub struct DeploymentOrchestrator {
    executor: DeploymentExecutor,
    prober: StatusProber,
    trigger: TriggerBinding,
    clock: Arc<dyn Clock>,
    policy: PollingPolicy,
}

impl DeploymentOrchestrator {
    pub fn new(
        executor: DeploymentExecutor,
        prober: StatusProber,
        trigger: TriggerBinding,
        clock: Arc<dyn Clock>,
        policy: PollingPolicy,
    ) -> Self {
        Self {
            executor,
            prober,
            trigger,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &PollingPolicy {
        &self.policy
    }

    pub fn trigger(&self) -> &TriggerBinding {
        &self.trigger
    }

    pub fn prober(&self) -> &StatusProber {
        &self.prober
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// New execution in `Deploying`, due immediately
    pub fn start(&self, model_reference: ModelReference) -> WorkflowExecution {
        WorkflowExecution::new(model_reference, self.clock.now())
    }

    /// Run one step; terminal executions are left untouched
    pub async fn step(&self, execution: &mut WorkflowExecution) {
        match execution.state().clone() {
            WorkflowState::Deploying => self.deploy(execution).await,
            WorkflowState::Polling {
                endpoint_name,
                last_status,
            } => self.poll(execution, endpoint_name, last_status).await,
            _ => {}
        }
    }

    async fn deploy(&self, execution: &mut WorkflowExecution) {
        let request = match self
            .executor
            .build_request(execution.model_reference().clone())
        {
            Ok(request) => request,
            Err(err) => {
                warn!(execution_id = %execution.id(), error = %err, "Deployment configuration invalid");
                execution.transition(
                    WorkflowState::Failed {
                        endpoint_name: UNKNOWN_ENDPOINT.to_string(),
                        reason: err.to_string(),
                    },
                    self.clock.now(),
                );
                return;
            }
        };

        let result = self.executor.deploy(&request).await;
        let now = self.clock.now();

        if result.is_failed() {
            execution.transition(
                WorkflowState::Failed {
                    endpoint_name: result.endpoint_name,
                    reason: result.failure_reason,
                },
                now,
            );
            return;
        }

        info!(
            execution_id = %execution.id(),
            endpoint = %result.endpoint_name,
            status = %result.status,
            "Deployment started, polling endpoint"
        );
        execution.transition(
            WorkflowState::Polling {
                endpoint_name: result.endpoint_name,
                last_status: result.status,
            },
            now,
        );
        execution.schedule_next(now + self.policy.poll_interval);
    }

    async fn poll(
        &self,
        execution: &mut WorkflowExecution,
        endpoint_name: String,
        last_status: EndpointStatus,
    ) {
        let now = self.clock.now();

        if execution.elapsed_since_start(now) >= self.policy.timeout {
            let reason = format!(
                "Deployment exceeded the {} time budget; last endpoint status was {}",
                self.policy.budget_description(),
                last_status
            );
            warn!(execution_id = %execution.id(), endpoint = %endpoint_name, "{}", reason);
            execution.transition(
                WorkflowState::TimedOut {
                    endpoint_name,
                    last_status,
                    reason,
                },
                now,
            );
            return;
        }

        let probe = self.prober.probe(&endpoint_name).await;
        execution.record_poll();
        let now = self.clock.now();

        let next = match probe.status.class() {
            StatusClass::Succeeded => WorkflowState::Succeeded { endpoint_name },
            StatusClass::Failed => WorkflowState::Failed {
                endpoint_name,
                reason: probe.failure_reason,
            },
            StatusClass::Pending => WorkflowState::Polling {
                endpoint_name,
                last_status: probe.status,
            },
        };

        execution.transition(next, now);
        execution.schedule_next(now + self.policy.poll_interval);

        if let Some(outcome) = execution.state().outcome() {
            info!(
                execution_id = %execution.id(),
                outcome = %outcome,
                polls = execution.poll_count(),
                "Deployment finished"
            );
        }
    }

    /// Stateless step entry point: poll when an endpoint is named, otherwise
    /// treat the input as an approval event and deploy
    pub async fn handle_step(&self, input: StepInput) -> StepPayload {
        if let Some(endpoint_name) = input.endpoint() {
            let probe = self.prober.probe(endpoint_name).await;

            return match probe.status.class() {
                StatusClass::Failed => StepPayload::failed(endpoint_name, probe.failure_reason),
                _ => StepPayload::in_progress(endpoint_name, probe.status.as_str()),
            };
        }

        if !input.has_detail() {
            return StepPayload::failed(UNKNOWN_ENDPOINT, MISSING_STEP_INPUT_REASON);
        }

        let model_reference = match self.trigger.evaluate(&input.event()) {
            TriggerDecision::Deploy(reference) => reference,
            TriggerDecision::Skip { .. } => return StepPayload::skipped(),
            TriggerDecision::Invalid(err) => {
                return StepPayload::failed(UNKNOWN_ENDPOINT, err.to_string());
            }
        };

        let request = match self.executor.build_request(model_reference) {
            Ok(request) => request,
            Err(err) => return StepPayload::failed(UNKNOWN_ENDPOINT, err.to_string()),
        };

        let result = self.executor.deploy(&request).await;
        if result.is_failed() {
            StepPayload::failed(result.endpoint_name, result.failure_reason)
        } else {
            StepPayload::in_progress(result.endpoint_name, result.status.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use crate::domain::deployment::{DeploymentSettings, ManualClock, ResourceNamer};
    use crate::domain::execution::DeploymentOutcome;
    use crate::infrastructure::platform::{InMemoryPlatform, PlatformOperation, ScriptedStatus};

    fn settings() -> DeploymentSettings {
        DeploymentSettings {
            model_package_group_name: "churn".to_string(),
            endpoint_name: Some("churn-ep".to_string()),
            execution_role_arn: "arn:aws:iam::123:role/exec".to_string(),
            kms_key_id: "key-1".to_string(),
            ..Default::default()
        }
    }

    fn orchestrator(
        platform: Arc<InMemoryPlatform>,
        clock: Arc<ManualClock>,
        settings: DeploymentSettings,
    ) -> DeploymentOrchestrator {
        DeploymentOrchestrator::new(
            DeploymentExecutor::new(settings, ResourceNamer::new(clock.clone()), platform.clone()),
            StatusProber::new(platform),
            TriggerBinding::default(),
            clock,
            PollingPolicy::default(),
        )
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn approved_event() -> serde_json::Value {
        json!({
            "detail": {
                "ModelPackageStatus": "Completed",
                "ModelApprovalStatus": "Approved",
                "ModelPackageArn": "arn:x"
            }
        })
    }

    /// Step until terminal, advancing simulated time by the poll interval
    async fn run(
        orchestrator: &DeploymentOrchestrator,
        clock: &ManualClock,
        execution: &mut WorkflowExecution,
        max_steps: usize,
    ) {
        for _ in 0..max_steps {
            orchestrator.step(execution).await;
            if execution.is_terminal() {
                return;
            }
            clock.advance(orchestrator.policy().poll_interval);
        }
    }

    #[tokio::test]
    async fn test_in_service_on_third_poll_succeeds() {
        let platform = Arc::new(InMemoryPlatform::new().with_status_script(vec![
            ScriptedStatus::new(EndpointStatus::Creating),
            ScriptedStatus::new(EndpointStatus::Creating),
            ScriptedStatus::new(EndpointStatus::InService),
        ]));
        let clock = clock();
        let orchestrator = orchestrator(platform.clone(), clock.clone(), settings());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());

        run(&orchestrator, &clock, &mut execution, 10).await;

        assert_eq!(
            execution.state(),
            &WorkflowState::Succeeded {
                endpoint_name: "churn-ep".to_string()
            }
        );
        assert_eq!(execution.poll_count(), 3);
        assert_eq!(platform.call_count(PlatformOperation::DescribeEndpoint), 3);

        let payload = execution.payload();
        assert_eq!(payload.status_code, 200);
        assert_eq!(payload.endpoint_status, "InService");
        assert_eq!(payload.endpoint_name, "churn-ep");
    }

    #[tokio::test]
    async fn test_failed_on_first_poll_keeps_reason() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_status_script(vec![ScriptedStatus::failed("CapacityError")]),
        );
        let clock = clock();
        let orchestrator = orchestrator(platform, clock.clone(), settings());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());

        run(&orchestrator, &clock, &mut execution, 10).await;

        assert_eq!(execution.state().outcome(), Some(DeploymentOutcome::Failed));
        assert_eq!(execution.poll_count(), 1);

        let payload = execution.payload();
        assert_eq!(payload.status_code, 500);
        assert_eq!(payload.endpoint_status, "Failed");
        assert_eq!(payload.failure_reason, "CapacityError");
    }

    #[tokio::test]
    async fn test_never_ready_endpoint_times_out() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_status_script(vec![ScriptedStatus::new(EndpointStatus::Creating)]),
        );
        let clock = clock();
        let orchestrator = orchestrator(platform, clock.clone(), settings());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());

        // 2h / 30s = 240 polls, plus the deploy step and the timeout step
        run(&orchestrator, &clock, &mut execution, 1000).await;

        assert_eq!(execution.state().outcome(), Some(DeploymentOutcome::TimedOut));
        assert_eq!(execution.poll_count(), 239);
        assert!(execution.elapsed_time() >= Duration::hours(2));

        let payload = execution.payload();
        assert_eq!(payload.status_code, 500);
        assert_eq!(payload.endpoint_status, "TimedOut");
        assert_eq!(
            payload.failure_reason,
            "Deployment exceeded the 2h time budget; last endpoint status was Creating"
        );
    }

    #[tokio::test]
    async fn test_deploy_failure_is_terminal_without_retry() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.fail_next(
            PlatformOperation::CreateEndpointConfig,
            crate::domain::deployment::PlatformError::api("CreateEndpointConfig", None, "quota"),
        );
        let clock = clock();
        let orchestrator = orchestrator(platform.clone(), clock.clone(), settings());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());

        run(&orchestrator, &clock, &mut execution, 10).await;

        assert_eq!(
            execution.state(),
            &WorkflowState::Failed {
                endpoint_name: "unknown".to_string(),
                reason: "CreateEndpointConfig failed: quota".to_string(),
            }
        );
        assert_eq!(platform.call_count(PlatformOperation::CreateModel), 1);
        assert_eq!(platform.call_count(PlatformOperation::DescribeEndpoint), 0);
    }

    #[tokio::test]
    async fn test_invalid_settings_fail_without_platform_calls() {
        let platform = Arc::new(InMemoryPlatform::new());
        let clock = clock();
        let orchestrator = orchestrator(platform.clone(), clock, DeploymentSettings::default());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());

        orchestrator.step(&mut execution).await;

        assert_eq!(execution.state().outcome(), Some(DeploymentOutcome::Failed));
        assert!(execution
            .failure_reason()
            .unwrap_or_default()
            .contains("execution_role_arn"));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_first_poll_waits_one_interval() {
        let platform = Arc::new(InMemoryPlatform::new());
        let clock = clock();
        let orchestrator = orchestrator(platform, clock.clone(), settings());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());

        orchestrator.step(&mut execution).await;

        assert_eq!(execution.state().name(), "polling");
        assert!(!execution.is_due(clock.now()));
        assert!(execution.is_due(clock.now() + Duration::seconds(30)));
    }

    #[tokio::test]
    async fn test_resumes_from_checkpoint() {
        let platform = Arc::new(InMemoryPlatform::new());
        let clock = clock();
        let first = orchestrator(platform.clone(), clock.clone(), settings());
        let mut execution = first.start(ModelReference::new("arn:x").unwrap());

        first.step(&mut execution).await;
        let checkpoint = serde_json::to_string(&execution).unwrap();
        drop(first);

        // a fresh orchestrator over the same platform picks the attempt up
        let resumed_orchestrator = orchestrator(platform, clock.clone(), settings());
        let mut resumed: WorkflowExecution = serde_json::from_str(&checkpoint).unwrap();
        clock.advance(Duration::seconds(30));
        run(&resumed_orchestrator, &clock, &mut resumed, 10).await;

        assert_eq!(resumed.state().outcome(), Some(DeploymentOutcome::Succeeded));
    }

    #[tokio::test]
    async fn test_terminal_step_is_noop() {
        let platform = Arc::new(InMemoryPlatform::new());
        let clock = clock();
        let orchestrator = orchestrator(platform.clone(), clock, settings());
        let mut execution = orchestrator.start(ModelReference::new("arn:x").unwrap());
        execution.transition(
            WorkflowState::Succeeded {
                endpoint_name: "churn-ep".to_string(),
            },
            orchestrator.now(),
        );

        orchestrator.step(&mut execution).await;

        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_handle_step_round_trip_until_in_service() {
        let platform = Arc::new(InMemoryPlatform::new().with_status_script(vec![
            ScriptedStatus::new(EndpointStatus::Creating),
            ScriptedStatus::new(EndpointStatus::Creating),
            ScriptedStatus::new(EndpointStatus::InService),
        ]));
        let orchestrator = orchestrator(platform, clock(), settings());

        let mut payload = orchestrator
            .handle_step(StepInput::for_event(approved_event()))
            .await;
        assert_eq!(payload.status_code, 200);
        assert_eq!(payload.endpoint_status, "Creating");

        let mut polls = 0;
        while payload.endpoint_status != "InService" && polls < 10 {
            let wire = serde_json::to_value(&payload).unwrap();
            let input: StepInput = serde_json::from_value(wire).unwrap();
            payload = orchestrator.handle_step(input).await;
            polls += 1;
        }

        assert_eq!(polls, 3);
        assert_eq!(
            payload,
            StepPayload::in_progress("churn-ep", "InService")
        );
    }

    #[tokio::test]
    async fn test_handle_step_failed_probe() {
        let platform = Arc::new(
            InMemoryPlatform::new()
                .with_status_script(vec![ScriptedStatus::failed("CapacityError")]),
        );
        let orchestrator = orchestrator(platform, clock(), settings());

        orchestrator
            .handle_step(StepInput::for_event(approved_event()))
            .await;
        let payload = orchestrator
            .handle_step(StepInput::for_endpoint("churn-ep"))
            .await;

        assert_eq!(payload.status_code, 500);
        assert_eq!(payload.endpoint_status, "Failed");
        assert_eq!(payload.failure_reason, "CapacityError");
    }

    #[tokio::test]
    async fn test_handle_step_skips_unapproved_event() {
        let platform = Arc::new(InMemoryPlatform::new());
        let orchestrator = orchestrator(platform.clone(), clock(), settings());

        let payload = orchestrator
            .handle_step(StepInput::for_event(json!({
                "detail": {"ModelPackageStatus": "Completed", "ModelApprovalStatus": "Rejected"}
            })))
            .await;

        assert_eq!(payload, StepPayload::skipped());
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_handle_step_without_endpoint_or_detail() {
        let orchestrator = orchestrator(Arc::new(InMemoryPlatform::new()), clock(), settings());

        let payload = orchestrator.handle_step(StepInput::default()).await;

        assert_eq!(
            payload,
            StepPayload::failed("unknown", MISSING_STEP_INPUT_REASON)
        );
    }
}
