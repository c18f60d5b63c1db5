//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context { json: cli.json };

    match cli.command {
        Commands::Install(install_args) => commands::install::execute(ctx, install_args).await,
        Commands::Uninstall(uninstall_args) => {
            commands::uninstall::execute(ctx, uninstall_args).await
        }
        Commands::Issue(issue_args) => commands::issue::execute(ctx, issue_args),
        Commands::Status => commands::status::execute(ctx).await,
    }
}
