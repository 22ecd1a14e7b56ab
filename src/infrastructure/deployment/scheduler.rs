//! Timer-driven execution of due orchestrator steps

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::service::DeploymentServiceTrait;
use crate::domain::execution::{ExecutionId, WorkflowExecution};
use crate::domain::DomainError;

/// Wakes up every tick and advances whatever executions are due
#[derive(Debug, Clone)]
pub struct PollingScheduler {
    service: Arc<dyn DeploymentServiceTrait>,
    tick: Duration,
    poll_interval: Duration,
}

impl PollingScheduler {
    pub fn new(
        service: Arc<dyn DeploymentServiceTrait>,
        tick: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            tick,
            poll_interval,
        }
    }

    /// Loop until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(tick_secs = self.tick.as_secs(), "Polling scheduler started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Polling scheduler stopped");
                    return;
                }
                _ = interval.tick() => {
                    match self.service.advance_due().await {
                        Ok(0) => {}
                        Ok(count) => debug!(count, "Advanced due executions"),
                        Err(err) => warn!(error = %err, "Failed to load due executions"),
                    }
                }
            }
        }
    }

    /// Advance one execution until it is terminal, sleeping between polls
    pub async fn drive(&self, id: &ExecutionId) -> Result<WorkflowExecution, DomainError> {
        loop {
            let execution = self.service.advance(id).await?;

            if execution.is_terminal() {
                return Ok(execution);
            }

            debug!(
                execution_id = %id,
                status = %execution.current_status(),
                "Waiting for next poll"
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::domain::deployment::{
        DeploymentSettings, EndpointStatus, ManualClock, ResourceNamer,
    };
    use crate::domain::execution::{DeploymentOutcome, PollingPolicy};
    use crate::infrastructure::deployment::{
        DeploymentExecutor, DeploymentOrchestrator, DeploymentService, StatusProber,
        TriggerBinding,
    };
    use crate::infrastructure::platform::{InMemoryPlatform, ScriptedStatus};
    use crate::infrastructure::storage::InMemoryStorage;

    fn service(platform: Arc<InMemoryPlatform>) -> Arc<DeploymentService> {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let settings = DeploymentSettings {
            model_package_group_name: "churn".to_string(),
            execution_role_arn: "arn:aws:iam::123:role/exec".to_string(),
            kms_key_id: "key-1".to_string(),
            ..Default::default()
        };
        let orchestrator = DeploymentOrchestrator::new(
            DeploymentExecutor::new(settings, ResourceNamer::new(clock.clone()), platform.clone()),
            StatusProber::new(platform),
            TriggerBinding::default(),
            clock,
            PollingPolicy::from_secs(0, 3600),
        );
        let storage: Arc<InMemoryStorage<WorkflowExecution>> = Arc::new(InMemoryStorage::new());

        Arc::new(DeploymentService::new(Arc::new(orchestrator), storage))
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

    #[tokio::test]
    async fn test_drive_until_in_service() {
        let platform = Arc::new(InMemoryPlatform::new().with_status_script(vec![
            ScriptedStatus::new(EndpointStatus::Creating),
            ScriptedStatus::new(EndpointStatus::Updating),
            ScriptedStatus::new(EndpointStatus::InService),
        ]));
        let service = service(platform);
        let scheduler = PollingScheduler::new(service.clone(), Duration::from_millis(10), Duration::ZERO);

        let id = service
            .handle_event(&approved_event())
            .await
            .execution_id
            .unwrap();
        let execution = scheduler.drive(&id).await.unwrap();

        assert_eq!(execution.state().outcome(), Some(DeploymentOutcome::Succeeded));
        assert_eq!(execution.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_drive_unknown_execution() {
        let scheduler = PollingScheduler::new(
            service(Arc::new(InMemoryPlatform::new())),
            Duration::from_millis(10),
            Duration::ZERO,
        );

        assert!(scheduler.drive(&ExecutionId::generate()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_advances_due_executions_until_shutdown() {
        let service = service(Arc::new(InMemoryPlatform::new()));
        let scheduler = PollingScheduler::new(service.clone(), Duration::from_millis(5), Duration::ZERO);

        let id = service
            .handle_event(&approved_event())
            .await
            .execution_id
            .unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            scheduler
                .run(async {
                    let _ = rx.await;
                })
                .await;
        });

        let mut finished = false;
        for _ in 0..200 {
            if service.get(&id).await.unwrap().is_terminal() {
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(finished);
        assert_eq!(
            service.get(&id).await.unwrap().state().outcome(),
            Some(DeploymentOutcome::Succeeded)
        );
    }
}
