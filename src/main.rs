//! rgbench - distributed benchmark run orchestrator

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use rgbench_core::{
    InstallationRegistry, InstallationScriptSource, OrchestratorBuilder, Resolver, RunConfig,
    RunOutcome,
};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Commands::Run {
            config,
            installations,
        } => run(&config, &installations).await,
        cli::Commands::Validate { config } => validate(&config),
    }
}

async fn run(config_path: &str, installations_path: &str) -> Result<()> {
    let config = RunConfig::load(config_path)
        .with_context(|| format!("loading run config from {config_path}"))?;
    let installations = InstallationRegistry::load(installations_path)
        .with_context(|| format!("loading installation registry from {installations_path}"))?;

    let Some(installation) = installations.get(&config.installation).cloned() else {
        bail!("unknown installation '{}'", config.installation);
    };

    let orchestrator = OrchestratorBuilder::new()
        .config(config)
        .installations(installations)
        .resolver(Resolver::from_process_env(Default::default()))
        .script_source(Arc::new(InstallationScriptSource::new(&installation)))
        .build()
        .context("building orchestrator")?;

    match orchestrator.run_with_signal_handling().await? {
        RunOutcome::Success => Ok(()),
        RunOutcome::Failed => std::process::exit(1),
        RunOutcome::Cancelled => std::process::exit(130),
    }
}

fn validate(config_path: &str) -> Result<()> {
    let config = RunConfig::load(config_path)
        .with_context(|| format!("loading run config from {config_path}"))?;
    config.validate().context("invalid run config")?;

    tracing::info!(
        installation = %config.installation,
        nodes = config.nodes.len(),
        "run config is valid"
    );
    Ok(())
}
