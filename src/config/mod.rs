//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, LogFormat, LoggingConfig, MetricsConfig, PlatformConfig, ServerConfig,
    StorageSettings, TriggerConfig, WorkflowConfig,
};
