//! Routes command: list what the data directory would serve

use clap::Args;
use mock_api_core::{MockApiError, ServerConfig};
use mock_api_runtime::discover;
use serde_json::json;

/// Routes command arguments
#[derive(Args, Debug, Default)]
pub struct RoutesCommand {
    /// Print the routes as JSON
    #[arg(long)]
    pub json: bool,
}

impl RoutesCommand {
    /// Execute the routes command
    pub fn execute(&self, config: &ServerConfig) -> Result<(), MockApiError> {
        println!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &ServerConfig) -> Result<String, MockApiError> {
        let table = discover(&config.data_dir)?;

        if self.json {
            let routes: Vec<_> = table
                .iter()
                .map(|route| {
                    json!({
                        "name": route.name,
                        "path": config.route_path(route),
                        "data": route.display_path(),
                        "schema": route.schema_path(&config.data_dir).exists(),
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&routes)?);
        }

        if table.is_empty() {
            return Ok(format!("No routes found in {}", config.data_dir.display()));
        }

        let lines: Vec<String> = table
            .iter()
            .map(|route| {
                let missing = if route.schema_path(&config.data_dir).exists() {
                    ""
                } else {
                    " (missing schema)"
                };
                format!(
                    "{}{}  <- {}{}",
                    config.base_url(),
                    config.route_path(route),
                    route.display_path(),
                    missing
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}
