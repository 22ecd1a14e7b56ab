//! Probe command - one status read for an endpoint

use clap::Args;

use crate::domain::deployment::EndpointStatus;
use crate::infrastructure::deployment::DeploymentServiceTrait;

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Endpoint to describe
    pub endpoint_name: String,
}

pub async fn run(args: ProbeArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let service = crate::create_deployment_service(&config).await?;
    let result = service.probe(&args.endpoint_name).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.status == EndpointStatus::Failed {
        anyhow::bail!("Endpoint '{}' failed: {}", args.endpoint_name, result.failure_reason);
    }

    Ok(())
}
