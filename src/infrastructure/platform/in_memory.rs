//! Deterministic in-process hosting platform
//!
//! Used by tests and by `platform.kind = "in_memory"` dry runs. Endpoints walk
//! through a scripted list of statuses, one entry per describe call, and stay
//! on the last entry once the script is exhausted.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::deployment::{
    Endpoint, EndpointConfigResource, EndpointStatus, ModelHostingPlatform, ModelResource,
    PlatformError, ResourceTag,
};

/// Platform operations that can be observed or made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformOperation {
    CreateModel,
    CreateEndpointConfig,
    CreateEndpoint,
    UpdateEndpoint,
    DescribeEndpoint,
}

impl PlatformOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateModel => "CreateModel",
            Self::CreateEndpointConfig => "CreateEndpointConfig",
            Self::CreateEndpoint => "CreateEndpoint",
            Self::UpdateEndpoint => "UpdateEndpoint",
            Self::DescribeEndpoint => "DescribeEndpoint",
        }
    }
}

impl fmt::Display for PlatformOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded call against the simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCall {
    pub operation: PlatformOperation,
    /// Name of the resource the call addressed
    pub target: String,
}

/// One scripted describe answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedStatus {
    pub status: EndpointStatus,
    pub failure_reason: Option<String>,
}

impl ScriptedStatus {
    pub fn new(status: EndpointStatus) -> Self {
        Self {
            status,
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: EndpointStatus::Failed,
            failure_reason: Some(reason.into()),
        }
    }
}

#[derive(Debug)]
struct SimulatedEndpoint {
    config_name: String,
    current: ScriptedStatus,
    pending: VecDeque<ScriptedStatus>,
    tags: Vec<ResourceTag>,
}

#[derive(Debug, Default)]
struct PlatformState {
    models: HashMap<String, (ModelResource, Vec<ResourceTag>)>,
    endpoint_configs: HashMap<String, (EndpointConfigResource, Vec<ResourceTag>)>,
    endpoints: HashMap<String, SimulatedEndpoint>,
    script: Option<Vec<ScriptedStatus>>,
    failures: HashMap<PlatformOperation, PlatformError>,
    calls: Vec<PlatformCall>,
}

impl PlatformState {
    fn record(
        &mut self,
        operation: PlatformOperation,
        target: &str,
    ) -> Result<(), PlatformError> {
        self.calls.push(PlatformCall {
            operation,
            target: target.to_string(),
        });

        match self.failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Statuses a freshly created or updated endpoint will report
    fn rollout(&self, initial: EndpointStatus) -> VecDeque<ScriptedStatus> {
        match &self.script {
            Some(script) if !script.is_empty() => script.iter().cloned().collect(),
            _ => VecDeque::from([
                ScriptedStatus::new(initial),
                ScriptedStatus::new(EndpointStatus::InService),
            ]),
        }
    }
}

fn validation_error(operation: PlatformOperation, message: String) -> PlatformError {
    PlatformError::api(
        operation.as_str(),
        Some("ValidationException".to_string()),
        message,
    )
}

/// In-memory [`ModelHostingPlatform`]
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default rollout (one pending answer, then `InService`)
    pub fn with_status_script(self, script: Vec<ScriptedStatus>) -> Self {
        self.state().script = Some(script);
        self
    }

    /// Register an endpoint that already exists, e.g. from an earlier deployment
    pub fn with_existing_endpoint(
        self,
        endpoint_name: impl Into<String>,
        config_name: impl Into<String>,
        status: EndpointStatus,
    ) -> Self {
        self.state().endpoints.insert(
            endpoint_name.into(),
            SimulatedEndpoint {
                config_name: config_name.into(),
                current: ScriptedStatus::new(status),
                pending: VecDeque::new(),
                tags: Vec::new(),
            },
        );
        self
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: PlatformOperation, error: PlatformError) {
        self.state().failures.insert(operation, error);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, operation: PlatformOperation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn endpoint_config_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().endpoint_configs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn endpoint_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().endpoints.keys().cloned().collect();
        names.sort();
        names
    }

    /// Configuration the endpoint currently points at
    pub fn endpoint_config_of(&self, endpoint_name: &str) -> Option<String> {
        self.state()
            .endpoints
            .get(endpoint_name)
            .map(|endpoint| endpoint.config_name.clone())
    }

    pub fn endpoint_tags(&self, endpoint_name: &str) -> Vec<ResourceTag> {
        self.state()
            .endpoints
            .get(endpoint_name)
            .map(|endpoint| endpoint.tags.clone())
            .unwrap_or_default()
    }

    pub fn model(&self, model_name: &str) -> Option<ModelResource> {
        self.state()
            .models
            .get(model_name)
            .map(|(model, _)| model.clone())
    }

    pub fn endpoint_config(&self, config_name: &str) -> Option<EndpointConfigResource> {
        self.state()
            .endpoint_configs
            .get(config_name)
            .map(|(config, _)| config.clone())
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ModelHostingPlatform for InMemoryPlatform {
    async fn create_model(
        &self,
        model: &ModelResource,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError> {
        let operation = PlatformOperation::CreateModel;
        let mut state = self.state();
        state.record(operation, &model.name)?;

        if state.models.contains_key(&model.name) {
            return Err(validation_error(
                operation,
                format!("Cannot create already existing model \"{}\".", model.name),
            ));
        }

        state
            .models
            .insert(model.name.clone(), (model.clone(), tags.to_vec()));
        debug!(model = %model.name, "Simulated model created");

        Ok(())
    }

    async fn create_endpoint_config(
        &self,
        config: &EndpointConfigResource,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError> {
        let operation = PlatformOperation::CreateEndpointConfig;
        let mut state = self.state();
        state.record(operation, &config.name)?;

        if state.endpoint_configs.contains_key(&config.name) {
            return Err(validation_error(
                operation,
                format!(
                    "Cannot create already existing endpoint configuration \"{}\".",
                    config.name
                ),
            ));
        }

        let model_name = &config.production_variant.model_name;
        if !state.models.contains_key(model_name) {
            return Err(validation_error(
                operation,
                format!("Could not find model \"{}\".", model_name),
            ));
        }

        state
            .endpoint_configs
            .insert(config.name.clone(), (config.clone(), tags.to_vec()));

        Ok(())
    }

    async fn create_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
        tags: &[ResourceTag],
    ) -> Result<(), PlatformError> {
        let operation = PlatformOperation::CreateEndpoint;
        let mut state = self.state();
        state.record(operation, endpoint_name)?;

        if state.endpoints.contains_key(endpoint_name) {
            return Err(validation_error(
                operation,
                format!("Cannot create already existing endpoint \"{}\".", endpoint_name),
            ));
        }

        if !state.endpoint_configs.contains_key(endpoint_config_name) {
            return Err(validation_error(
                operation,
                format!(
                    "Could not find endpoint configuration \"{}\".",
                    endpoint_config_name
                ),
            ));
        }

        let mut pending = state.rollout(EndpointStatus::Creating);
        let current = pending
            .pop_front()
            .unwrap_or_else(|| ScriptedStatus::new(EndpointStatus::Creating));

        state.endpoints.insert(
            endpoint_name.to_string(),
            SimulatedEndpoint {
                config_name: endpoint_config_name.to_string(),
                current,
                pending,
                tags: tags.to_vec(),
            },
        );
        debug!(endpoint = %endpoint_name, "Simulated endpoint created");

        Ok(())
    }

    async fn update_endpoint(
        &self,
        endpoint_name: &str,
        endpoint_config_name: &str,
    ) -> Result<(), PlatformError> {
        let operation = PlatformOperation::UpdateEndpoint;
        let mut state = self.state();
        state.record(operation, endpoint_name)?;

        if !state.endpoints.contains_key(endpoint_name) {
            return Err(PlatformError::endpoint_not_found(endpoint_name));
        }

        if !state.endpoint_configs.contains_key(endpoint_config_name) {
            return Err(validation_error(
                operation,
                format!(
                    "Could not find endpoint configuration \"{}\".",
                    endpoint_config_name
                ),
            ));
        }

        let mut pending = state.rollout(EndpointStatus::Updating);
        let current = pending
            .pop_front()
            .unwrap_or_else(|| ScriptedStatus::new(EndpointStatus::Updating));

        if let Some(endpoint) = state.endpoints.get_mut(endpoint_name) {
            endpoint.config_name = endpoint_config_name.to_string();
            endpoint.current = current;
            endpoint.pending = pending;
        }
        debug!(endpoint = %endpoint_name, "Simulated endpoint updated");

        Ok(())
    }

    async fn describe_endpoint(&self, endpoint_name: &str) -> Result<Endpoint, PlatformError> {
        let mut state = self.state();
        state.record(PlatformOperation::DescribeEndpoint, endpoint_name)?;

        let endpoint = state
            .endpoints
            .get_mut(endpoint_name)
            .ok_or_else(|| PlatformError::endpoint_not_found(endpoint_name))?;

        let answer = endpoint.current.clone();
        if let Some(next) = endpoint.pending.pop_front() {
            endpoint.current = next;
        }

        let described = Endpoint::new(endpoint_name, answer.status);
        Ok(match answer.failure_reason {
            Some(reason) => described.with_failure_reason(reason),
            None => described,
        })
    }
}
