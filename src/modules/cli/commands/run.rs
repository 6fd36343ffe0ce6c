//! Run command implementation

use clap::Args;
use mock_api_core::{MockApiError, ServerConfig};
use mock_api_runtime::{shutdown_signal, Runtime};
use tracing::info;

/// Run command arguments
#[derive(Args, Debug, Default)]
pub struct RunCommand {}

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, config: ServerConfig) -> Result<(), MockApiError> {
        info!("Loading routes from: {}", config.data_dir.display());

        let runtime = Runtime::new(config).await?;
        runtime.run(shutdown_signal()).await
    }
}
