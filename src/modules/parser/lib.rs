//! Schema and data file parsing for Mock API
//!
//! This crate turns the files of one route into in-memory structures: the
//! GraphQL schema document and the declarative data module that answers its
//! root fields.

pub mod data;
pub mod schema;
pub mod template;
pub mod validator;

pub use data::{DataFormat, DataModule, Resolvers};
pub use schema::SchemaDocument;
pub use validator::SchemaValidator;

use mock_api_core::MockApiError;
use std::path::Path;

/// Parse a schema file from a path
pub fn parse_schema_file(path: impl AsRef<Path>) -> Result<SchemaDocument, MockApiError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        MockApiError::Schema(format!("Failed to read '{}': {}", path.display(), e))
    })?;

    SchemaDocument::parse(&content)
}

/// Load a data file from a path, choosing the format from its extension
pub fn load_data_file(path: impl AsRef<Path>) -> Result<DataModule, MockApiError> {
    let path = path.as_ref();
    let format = DataFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| {
        MockApiError::DataModule(format!("Failed to read '{}': {}", path.display(), e))
    })?;

    DataModule::parse(&content, format)
}
