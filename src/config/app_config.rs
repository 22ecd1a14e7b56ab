use serde::Deserialize;

use crate::domain::deployment::DeploymentSettings;
use crate::domain::event::EventRule;
use crate::domain::execution::{
    PollingPolicy, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS, MAX_POLICY_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub storage: StorageSettings,
    pub platform: PlatformConfig,
    pub workflow: WorkflowConfig,
    pub trigger: TriggerConfig,
    pub deployment: DeploymentSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Prometheus exporter settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

/// Where workflow executions are checkpointed
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub database_url: Option<String>,
    pub table: String,
}

/// Which hosting platform adapter to use
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// `sagemaker` or `in_memory`
    pub kind: String,
    /// Falls back to the AWS default provider chain when unset
    pub region: Option<String>,
}

/// Polling cadence, time budget and scheduler tick
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
    pub scheduler_tick_secs: u64,
}

/// Event filter applied before the approval predicate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub sources: Vec<String>,
    pub detail_types: Vec<String>,
    pub model_package_group_name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            table: "workflow_executions".to_string(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            kind: "sagemaker".to_string(),
            region: None,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            scheduler_tick_secs: 5,
        }
    }
}

impl WorkflowConfig {
    pub fn policy(&self) -> PollingPolicy {
        PollingPolicy::from_secs(self.poll_interval_secs, self.timeout_secs)
    }

    pub fn scheduler_tick(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler_tick_secs.clamp(1, MAX_POLICY_SECS))
    }

    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("timeout_secs", self.timeout_secs),
            ("scheduler_tick_secs", self.scheduler_tick_secs),
        ];

        for (name, value) in values {
            if value > MAX_POLICY_SECS {
                return Err(format!(
                    "workflow.{} must be at most {} seconds, got {}",
                    name, MAX_POLICY_SECS, value
                ));
            }
        }

        if self.timeout_secs == 0 {
            return Err("workflow.timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl TriggerConfig {
    pub fn rule(&self) -> EventRule {
        EventRule {
            sources: self.sources.clone(),
            detail_types: self.detail_types.clone(),
            model_package_group_name: self.model_package_group_name.clone(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("trigger.sources")
                    .with_list_parse_key("trigger.detail_types")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config
            .workflow
            .validate()
            .map_err(config::ConfigError::Message)?;

        Ok(app_config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
