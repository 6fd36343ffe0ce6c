//! Mock API CLI
//!
//! Command-line interface for the Mock API GraphQL mock server.

use clap::Parser;
use mock_api_cli::{Cli, Commands};
use mock_api_core::MockApiError;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), MockApiError> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.server_config();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(cli.log_writer()))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Run(cmd) => {
            cmd.execute(config).await?;
        }
        Commands::Dev(cmd) => {
            cmd.execute(config, cli.verbose).await?;
        }
        Commands::Worker(cmd) => {
            cmd.execute(config).await?;
        }
        Commands::Routes(cmd) => {
            cmd.execute(&config)?;
        }
        Commands::Init(cmd) => {
            cmd.execute(&config.data_dir)?;
        }
    }

    Ok(())
}
