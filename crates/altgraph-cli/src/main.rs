//! altgraph CLI - Command-line interface for the altgraph identity resolver.

use altgraph_cli::commands;
use altgraph_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> altgraph_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref(), cli.data_dir.clone())?;

    // Determine output format and color setting
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        // Readable even when the snapshot is not
        Command::Overrides => commands::execute_overrides(&config, &formatter),
        command => {
            let coordinator = commands::open_coordinator(&config)?;
            dispatch(command, &config, coordinator, &formatter).await
        }
    }
}

async fn dispatch(
    command: Command,
    config: &Config,
    coordinator: commands::Coordinator,
    formatter: &Formatter,
) -> altgraph_cli::Result<()> {
    match command {
        Command::Refresh => commands::execute_refresh(&coordinator, formatter).await,
        Command::Watch(args) => commands::execute_watch(args, Arc::new(coordinator), formatter).await,
        Command::Lookup(args) => commands::execute_lookup(args, &coordinator, formatter).await,
        Command::Ingest(args) => commands::execute_ingest(args, &coordinator, formatter).await,
        Command::Import(args) => commands::execute_import(args, &coordinator, formatter).await,
        Command::Stats => commands::execute_stats(&coordinator, formatter).await,
        Command::List(args) => commands::execute_list(args, &coordinator, formatter).await,
        Command::Clean(args) => commands::execute_clean(args, &coordinator, formatter).await,
        Command::Overrides => commands::execute_overrides(config, formatter),
    }
}
