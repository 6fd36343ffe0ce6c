//! Data modules: the resolver side of a route
//!
//! A data module is a JSON or YAML document whose top level maps root field
//! names to the values they return. Values may contain `{{ args.NAME }}`
//! placeholders that are filled from the field's arguments.

use mock_api_core::MockApiError;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

use crate::template;

/// Named-function lookup used to answer root fields
///
/// Any data source only has to expose the fields its schema asks for by name.
pub trait Resolvers: Send + Sync {
    /// Produce the value of `field` for the given arguments
    fn resolve(&self, field: &str, args: &Map<String, Value>) -> Result<Value, MockApiError>;

    /// Whether a resolver exists for `field`
    fn has(&self, field: &str) -> bool;

    /// Names of every resolver
    fn names(&self) -> Vec<&str>;
}

/// Supported data file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, MockApiError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(DataFormat::Json),
            Some("yaml") | Some("yml") => Ok(DataFormat::Yaml),
            _ => Err(MockApiError::DataModule(format!(
                "Unsupported data file '{}': expected .json, .yaml or .yml",
                path.display()
            ))),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Json => write!(f, "json"),
            DataFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Declarative resolvers loaded from a data file
#[derive(Debug, Clone, Default)]
pub struct DataModule {
    fields: Map<String, Value>,
}

impl DataModule {
    /// Parse a data module from file content
    pub fn parse(content: &str, format: DataFormat) -> Result<Self, MockApiError> {
        let value: Value = match format {
            DataFormat::Json => serde_json::from_str(content)?,
            // An empty YAML document is a module with no resolvers
            DataFormat::Yaml if content.trim().is_empty() => Value::Object(Map::new()),
            DataFormat::Yaml => serde_yaml::from_str(content)?,
        };

        Self::from_value(value)
    }

    /// Build a data module from an already parsed document
    pub fn from_value(value: Value) -> Result<Self, MockApiError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(MockApiError::DataModule(format!(
                "Top level must map field names to values, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Raw (unsubstituted) value for a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Resolvers for DataModule {
    fn resolve(&self, field: &str, args: &Map<String, Value>) -> Result<Value, MockApiError> {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| MockApiError::Resolver(format!("No resolver for field '{}'", field)))?;

        Ok(template::substitute(value, args))
    }

    fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
