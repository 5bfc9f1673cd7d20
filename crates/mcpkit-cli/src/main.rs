//! mcpkit - list and call tools and prompts on a configured target

use clap::Parser;
use colored::Colorize;
use mcpkit_cli::{run, telemetry_config, Cli};
use mcpkit_telemetry::init_subscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(&cli).await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_cli(cli: &Cli) -> anyhow::Result<()> {
    let config = mcpkit_config::load_config(cli.config.as_deref())?;
    init_subscriber(&telemetry_config(cli, &config))?;

    let output = run(&config, &cli.command).await?;

    if cli.json {
        println!("{}", output.to_json()?);
    } else {
        println!("{}", output.to_text());
    }

    Ok(())
}
