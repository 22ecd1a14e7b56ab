//! CLI module for the model deploy orchestrator
//!
//! Provides subcommands:
//! - `serve`: HTTP API plus the background polling scheduler
//! - `trigger`: run the trigger entry point for an event file
//! - `probe`: read an endpoint's status once

pub mod probe;
pub mod serve;
pub mod trigger;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Model Deploy Orchestrator - provisions endpoints for approved model packages
#[derive(Parser)]
#[command(name = "model-deploy-orchestrator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API and polling scheduler
    Serve,

    /// Run the trigger entry point for an approval event
    Trigger(trigger::TriggerArgs),

    /// Probe an endpoint's status once
    Probe(probe::ProbeArgs),
}

/// Shared startup: `.env`, layered config, logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger() {
        let cli = Cli::try_parse_from([
            "model-deploy-orchestrator",
            "trigger",
            "--event",
            "event.json",
            "--wait",
        ])
        .unwrap();

        match cli.command {
            Command::Trigger(args) => {
                assert_eq!(args.event.to_str(), Some("event.json"));
                assert!(args.wait);
            }
            _ => panic!("Expected trigger command"),
        }
    }

    #[test]
    fn test_parse_probe() {
        let cli = Cli::try_parse_from(["model-deploy-orchestrator", "probe", "churn-retention"])
            .unwrap();

        match cli.command {
            Command::Probe(args) => assert_eq!(args.endpoint_name, "churn-retention"),
            _ => panic!("Expected probe command"),
        }
    }

    #[test]
    fn test_trigger_requires_event() {
        assert!(Cli::try_parse_from(["model-deploy-orchestrator", "trigger"]).is_err());
    }
}
