//! Trigger command - runs the trigger entry point for an event file

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::Value;
use tracing::info;

use crate::infrastructure::deployment::{DeploymentServiceTrait, PollingScheduler};

#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Path to a JSON approval event
    #[arg(long)]
    pub event: PathBuf,

    /// Keep polling until the deployment reaches a terminal state
    #[arg(long)]
    pub wait: bool,
}

pub async fn run(args: TriggerArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let event = read_event(&args.event)?;

    let service = crate::create_deployment_service(&config).await?;
    let outcome = service.handle_event(&event).await;

    let payload = match (outcome.execution_id, args.wait) {
        (Some(id), true) => {
            info!(execution_id = %id, "Waiting for deployment to finish");
            let scheduler = PollingScheduler::new(
                service,
                config.workflow.scheduler_tick(),
                config.workflow.policy().poll_interval_std(),
            );
            scheduler.drive(&id).await?.payload()
        }
        _ => outcome.payload,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);

    if payload.is_error() {
        anyhow::bail!(
            "Deployment of '{}' ended with {}: {}",
            payload.endpoint_name,
            payload.endpoint_status,
            payload.failure_reason
        );
    }

    Ok(())
}

fn read_event(path: &PathBuf) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("Event file {} is not valid JSON", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_event_missing_file() {
        let err = read_event(&PathBuf::from("/nonexistent/event.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read event file"));
    }

    #[test]
    fn test_read_event() {
        let path = std::env::temp_dir().join(format!("event-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"detail": {"ModelPackageArn": "arn:x"}}"#).unwrap();

        let event = read_event(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(event["detail"]["ModelPackageArn"], "arn:x");
    }

    #[test]
    fn test_read_event_invalid_json() {
        let path = std::env::temp_dir().join(format!("event-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();

        let err = read_event(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("is not valid JSON"));
    }
}
