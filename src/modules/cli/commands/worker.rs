//! Worker command: one supervised server generation

use clap::{ArgAction, Args};
use mock_api_core::{MockApiError, ServerConfig};
use mock_api_runtime::{
    shutdown_signal, spawn_watcher, stdin_closed, ChangeSignal, ChangeWatch, Runtime,
};
use mock_api_types::ControlMessage;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Worker command arguments
#[derive(Args, Debug)]
pub struct WorkerCommand {
    /// Quiet period in milliseconds before a change triggers a restart
    #[arg(long, default_value_t = 2000)]
    pub quiet_period: u64,

    /// First launch under the current supervisor
    #[arg(long, env = "MOCK_API_INITIAL", default_value_t = true, action = ArgAction::Set)]
    pub initial: bool,
}

impl WorkerCommand {
    /// Serve until stdin closes, asking for a restart when the data changes
    pub async fn execute(&self, config: ServerConfig) -> Result<(), MockApiError> {
        let config = config
            .with_quiet_period(Duration::from_millis(self.quiet_period))
            .with_initial(self.initial);

        let runtime = Runtime::new(config.clone()).await?;

        let (event_tx, event_rx) = mpsc::channel(64);
        let _watcher = spawn_watcher(&config.data_dir, event_tx)?;

        let (signal_tx, signal_rx) = mpsc::channel(4);
        tokio::spawn(ChangeWatch::new(&config.data_dir, config.quiet_period).run(event_rx, signal_tx));

        tokio::spawn(announce_restarts(signal_rx, config.base_url(), std::io::stdout()));

        runtime
            .run(async {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = stdin_closed() => {}
                }
            })
            .await
    }
}

/// Write one control line per change signal for the supervisor
async fn announce_restarts<W: Write>(
    mut signals: mpsc::Receiver<ChangeSignal>,
    base_url: String,
    mut out: W,
) {
    while let Some(signal) = signals.recv().await {
        info!("- {} changed", signal.file);
        info!("> Mock API server restarts on ... {}", base_url);

        let line = ControlMessage::from(signal).to_line();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to send restart request: {}", e);
            break;
        }
    }
}
