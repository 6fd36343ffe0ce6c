//! Dev command implementation with restart on change

use clap::Args;
use mock_api_core::{MockApiError, ServerConfig};
use mock_api_runtime::{shutdown_signal, RestartPolicy, Supervisor, WorkerLauncher};
use std::time::Duration;
use tracing::info;

/// Dev command arguments
#[derive(Args, Debug)]
pub struct DevCommand {
    /// Quiet period in milliseconds before a change triggers a restart
    #[arg(long, default_value_t = 2000)]
    pub quiet_period: u64,

    /// Delay in milliseconds before a worker is relaunched
    #[arg(long, default_value_t = 500)]
    pub restart_delay: u64,
}

impl DevCommand {
    /// Supervise worker processes until interrupted
    pub async fn execute(&self, config: ServerConfig, verbose: bool) -> Result<(), MockApiError> {
        info!("Starting development mode with hot reload");
        info!("Watching: {}", config.data_dir.display());

        let launcher = WorkerLauncher::current_exe(self.worker_args(&config, verbose))?;
        let policy = RestartPolicy::new(Duration::from_millis(self.restart_delay));

        Supervisor::new(launcher, config.base_url())
            .with_policy(policy)
            .run_with_shutdown(shutdown_signal())
            .await
    }

    /// Arguments that relaunch this configuration as a worker
    fn worker_args(&self, config: &ServerConfig, verbose: bool) -> Vec<String> {
        let mut args = vec![
            "worker".to_string(),
            "--data".to_string(),
            config.data_dir.display().to_string(),
            "--host".to_string(),
            config.host.clone(),
            "--port".to_string(),
            config.port.to_string(),
            "--quiet-period".to_string(),
            self.quiet_period.to_string(),
            // Passed even when empty; an inherited MOCK_API_NAMESPACE must not apply
            format!("--namespace={}", config.namespace),
        ];

        if verbose {
            args.push("--verbose".to_string());
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    fn dev() -> DevCommand {
        DevCommand {
            quiet_period: 2000,
            restart_delay: 500,
        }
    }

    #[test]
    fn test_dev_command_args() {
        let cli = Cli::try_parse_from(["mock-api", "dev", "--quiet-period", "100", "--restart-delay", "50"]).unwrap();
        match cli.command {
            Commands::Dev(cmd) => {
                assert_eq!(cmd.quiet_period, 100);
                assert_eq!(cmd.restart_delay, 50);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_worker_args_forward_empty_namespace() {
        let config = ServerConfig::new("data").with_port(4000);
        let args = dev().worker_args(&config, false);
        assert_eq!(
            args,
            vec![
                "worker",
                "--data",
                "data",
                "--host",
                "127.0.0.1",
                "--port",
                "4000",
                "--quiet-period",
                "2000",
                "--namespace=",
            ]
        );

        let mut argv = vec!["mock-api".to_string()];
        argv.extend(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.server_config().namespace, "");
    }

    #[test]
    fn test_worker_args_round_trip_through_cli() {
        let config = ServerConfig::new("fixtures").with_namespace("mock");
        let mut argv = vec!["mock-api".to_string()];
        argv.extend(dev().worker_args(&config, true));

        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Worker(_)));

        let parsed = cli.server_config();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.namespace, "/mock");
    }
}
