//! Init command implementation

use clap::Args;
use mock_api_core::MockApiError;
use std::fs;
use std::path::Path;
use tracing::info;

const DIE_SCHEMA: &str = r#"type RandomDie {
  numSides: Int!
  rollOnce: Int!
  roll(numRolls: Int!): [Int]
}

type Query {
  getDie(numSides: Int = 6): RandomDie
}
"#;

const DIE_DATA: &str = r#"{
  "getDie": {
    "numSides": "{{ args.numSides }}",
    "rollOnce": 4,
    "roll": [3, 1, "{{ args.numRolls }}"]
  }
}
"#;

const ENV_EXAMPLE: &str = r#"# Address the mock server binds to
MOCK_API_HOST=127.0.0.1
MOCK_API_PORT=3000

# Prefix for every route, e.g. /mock
MOCK_API_NAMESPACE=
"#;

/// Init command arguments
#[derive(Args, Debug, Default)]
pub struct InitCommand {
    /// Directory receiving `.env.example`
    #[arg(short, long, default_value = ".")]
    pub output: String,

    /// Overwrite files that already exist
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, data_dir: &Path) -> Result<(), MockApiError> {
        info!("Initializing example routes in: {}", data_dir.display());

        fs::create_dir_all(data_dir)?;
        self.write(&data_dir.join("die.graphql"), DIE_SCHEMA)?;
        self.write(&data_dir.join("die.json"), DIE_DATA)?;

        let output_dir = Path::new(&self.output);
        fs::create_dir_all(output_dir)?;
        self.write(&output_dir.join(".env.example"), ENV_EXAMPLE)?;

        // Print instructions
        println!("\nMock API data directory initialized!");
        println!("\nNext steps:");
        println!("  1. Copy .env.example to .env and adjust it");
        println!("  2. Add <name>.graphql and <name>.json pairs under {}", data_dir.display());
        println!("  3. Run: mock-api dev -d {}", data_dir.display());

        Ok(())
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), MockApiError> {
        if path.exists() && !self.force {
            info!("Skipped existing: {}", path.display());
            return Ok(());
        }

        fs::write(path, content)?;
        info!("Created: {}", path.display());
        Ok(())
    }
}
