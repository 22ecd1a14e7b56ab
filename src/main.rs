use clap::Parser;
use model_deploy_orchestrator::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Trigger(args) => cli::trigger::run(args).await,
        Command::Probe(args) => cli::probe::run(args).await,
    }
}
