//! Deployment workflow components

mod executor;
mod orchestrator;
mod prober;
mod scheduler;
mod service;
mod trigger;

pub use executor::{DeploymentExecutor, DeploymentResult};
pub use orchestrator::{DeploymentOrchestrator, MISSING_STEP_INPUT_REASON};
pub use prober::{ProbeResult, StatusProber};
pub use scheduler::PollingScheduler;
pub use service::{DeploymentService, DeploymentServiceTrait, EventOutcome};
pub use trigger::{TriggerBinding, TriggerDecision};
