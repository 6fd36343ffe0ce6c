//! Consistency checks between a schema and its data module

use std::collections::HashSet;

use crate::data::{DataModule, Resolvers};
use crate::schema::SchemaDocument;
use crate::template;

/// Schema/data validator
///
/// Problems never reject a route; they are returned as warnings.
#[derive(Debug)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a data module against a schema, returning warnings
    pub fn validate(
        &self,
        schema: &SchemaDocument,
        data: &DataModule,
    ) -> Vec<String> {
        let mut warnings = Vec::new();
        self.validate_root_fields(schema, data, &mut warnings);
        self.validate_unused_resolvers(schema, data, &mut warnings);
        self.validate_placeholders(schema, data, &mut warnings);
        warnings
    }

    /// Every root field should have a resolver
    fn validate_root_fields(
        &self,
        schema: &SchemaDocument,
        data: &DataModule,
        warnings: &mut Vec<String>,
    ) {
        for field in schema.root_fields() {
            let name = field.name.node.as_str();
            if !data.has(name) {
                warnings.push(format!("Field '{}' has no resolver and resolves to null", name));
            }
        }
    }

    /// Resolvers nothing in the schema asks for
    fn validate_unused_resolvers(
        &self,
        schema: &SchemaDocument,
        data: &DataModule,
        warnings: &mut Vec<String>,
    ) {
        let root_names: HashSet<&str> = schema
            .root_fields()
            .iter()
            .map(|f| f.name.node.as_str())
            .collect();

        for name in data.names() {
            if !root_names.contains(name) {
                warnings.push(format!("Resolver '{}' is not referenced by the schema", name));
            }
        }
    }

    /// Placeholders should name an argument declared somewhere in the schema
    fn validate_placeholders(
        &self,
        schema: &SchemaDocument,
        data: &DataModule,
        warnings: &mut Vec<String>,
    ) {
        let declared: HashSet<String> = schema
            .types()
            .iter()
            .flat_map(|t| schema.object_fields(t.name.node.as_str()))
            .flat_map(|f| f.arguments.iter().map(|a| a.node.name.node.to_string()))
            .collect();

        for name in data.names() {
            let Some(value) = data.get(name) else {
                continue;
            };
            for arg in template::extract_arg_names(value) {
                if !declared.contains(&arg) {
                    warnings.push(format!(
                        "Placeholder 'args.{}' in '{}' matches no argument in the schema",
                        arg, name
                    ));
                }
            }
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}
