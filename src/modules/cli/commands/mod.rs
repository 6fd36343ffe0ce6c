//! CLI commands

mod dev;
mod init;
mod routes;
mod run;
mod worker;

pub use dev::DevCommand;
pub use init::InitCommand;
pub use routes::RoutesCommand;
pub use run::RunCommand;
pub use worker::WorkerCommand;

use clap::{Parser, Subcommand};
use mock_api_core::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

/// Mock API - GraphQL mock server generated from schema/data pairs
#[derive(Parser, Debug)]
#[command(name = "mock-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `.graphql` schemas and their data files
    ///
    /// This is a *global* option so it can be specified after subcommands,
    /// e.g. `mock-api dev -d fixtures`.
    #[arg(short = 'd', long = "data", global = true, default_value = "./data")]
    pub data: PathBuf,

    /// Host to bind
    #[arg(long, global = true, env = "MOCK_API_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind
    #[arg(short, long, global = true, env = "MOCK_API_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// URL prefix for every route, e.g. `/mock`
    #[arg(long, global = true, env = "MOCK_API_NAMESPACE", default_value = "")]
    pub namespace: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the mock API without watching for changes
    Run(RunCommand),

    /// Serve the mock API and restart it when the data directory changes
    Dev(DevCommand),

    /// Serve one generation of the mock API under `dev` supervision
    #[command(hide = true)]
    Worker(WorkerCommand),

    /// List the routes found in the data directory
    Routes(RoutesCommand),

    /// Scaffold a data directory with an example route
    Init(InitCommand),
}

impl Cli {
    /// Server configuration from the global options
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(&self.data)
            .with_host(&self.host)
            .with_port(self.port)
            .with_namespace(&self.namespace)
    }

    /// Whether warnings and errors are written to stderr
    ///
    /// A worker keeps every line on stdout, where the supervisor reads it.
    pub fn errors_to_stderr(&self) -> bool {
        !matches!(self.command, Commands::Worker(_))
    }

    /// Destination of log output for this invocation
    pub fn log_writer(&self) -> BoxMakeWriter {
        if self.errors_to_stderr() {
            BoxMakeWriter::new(
                std::io::stderr
                    .with_max_level(Level::WARN)
                    .or_else(std::io::stdout),
            )
        } else {
            BoxMakeWriter::new(std::io::stdout)
        }
    }
}
