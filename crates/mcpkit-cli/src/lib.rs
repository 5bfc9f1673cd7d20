//! mcpkit CLI - Command-line interface
//!
//! The `mcpkit` binary loads a configuration file, builds its target with
//! the default [`TargetFactory`], runs one command against it and closes it
//! again, whether or not the command succeeded.

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands};
pub use output::Output;

use anyhow::{Context, Result};
use mcpkit_config::McpkitConfig;
use mcpkit_targets::{Target, TargetFactory};
use mcpkit_telemetry::TelemetryConfig;
use std::sync::Arc;

/// Logging settings from the config file, with command-line overrides applied
pub fn telemetry_config(cli: &Cli, config: &McpkitConfig) -> TelemetryConfig {
    match &cli.log_level {
        Some(level) => config.telemetry.clone().with_level(level.clone()),
        None => config.telemetry.clone(),
    }
}

/// Run `command` against an initialized target
pub async fn execute(target: &dyn Target, command: &Commands) -> Result<Output> {
    let output = match command {
        Commands::Tools => Output::Tools(target.list_tools().await?),
        Commands::Call { tool, arguments } => {
            Output::Content(target.call_tool(tool, arguments.clone()).await?)
        }
        Commands::Prompts => Output::Prompts(target.list_prompts().await?),
        Commands::Prompt { name, args } => Output::Prompt(
            target
                .get_prompt(name, Commands::prompt_arguments(args))
                .await?,
        ),
    };
    Ok(output)
}

/// Build the configured target, run `command`, and close the target
pub async fn run(config: &McpkitConfig, command: &Commands) -> Result<Output> {
    run_with_factory(&TargetFactory::with_defaults(), config, command).await
}

pub async fn run_with_factory(
    factory: &Arc<TargetFactory>,
    config: &McpkitConfig,
    command: &Commands,
) -> Result<Output> {
    let mut target = factory
        .create(&config.target)
        .context("Failed to build target")?;
    let name = target.name().to_string();

    let outcome = match target.initialize().await {
        Ok(()) => execute(target.as_ref(), command).await,
        Err(err) => {
            Err(anyhow::Error::new(err).context(format!("Failed to initialize target '{name}'")))
        }
    };

    let closed = target.close().await;
    if let Err(err) = &closed {
        tracing::warn!(target_name = %name, error = %err, "failed to close target");
    }

    let output = outcome?;
    closed.with_context(|| format!("Failed to close target '{name}'"))?;
    Ok(output)
}
