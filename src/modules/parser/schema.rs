//! GraphQL schema documents
//!
//! Parsing is delegated to `async-graphql`'s SDL parser. This module checks
//! that the document only uses definitions the mock server can serve, merges
//! `extend type` blocks and resolves the root operation types.

use async_graphql::parser::types::{
    FieldDefinition, TypeDefinition, TypeKind, TypeSystemDefinition,
};
use async_graphql::parser::{parse_schema, Positioned};
use mock_api_core::MockApiError;

const DEFAULT_QUERY_ROOT: &str = "Query";
const DEFAULT_MUTATION_ROOT: &str = "Mutation";

/// A parsed, checked schema file
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    types: Vec<TypeDefinition>,
    query_root: String,
    mutation_root: Option<String>,
}

impl SchemaDocument {
    /// Parse SDL text
    pub fn parse(sdl: &str) -> Result<Self, MockApiError> {
        let document = parse_schema(sdl).map_err(|e| MockApiError::Schema(e.to_string()))?;

        let mut types: Vec<TypeDefinition> = Vec::new();
        let mut query_root = None;
        let mut mutation_root = None;

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    let schema = schema.node;
                    if schema.subscription.is_some() {
                        return Err(MockApiError::Schema(
                            "Subscriptions are not supported".to_string(),
                        ));
                    }
                    if let Some(query) = schema.query {
                        query_root = Some(query.node.to_string());
                    }
                    if let Some(mutation) = schema.mutation {
                        mutation_root = Some(mutation.node.to_string());
                    }
                }
                TypeSystemDefinition::Type(definition) => {
                    merge_type(&mut types, definition.node)?;
                }
                // Directive definitions carry no data for a mock
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        let query_root = query_root.unwrap_or_else(|| DEFAULT_QUERY_ROOT.to_string());
        let mutation_root = mutation_root.or_else(|| {
            find_object(&types, DEFAULT_MUTATION_ROOT).map(|_| DEFAULT_MUTATION_ROOT.to_string())
        });

        let doc = Self {
            types,
            query_root,
            mutation_root,
        };
        doc.check_root(&doc.query_root)?;
        if let Some(mutation) = &doc.mutation_root {
            doc.check_root(mutation)?;
        }

        Ok(doc)
    }

    fn check_root(&self, name: &str) -> Result<(), MockApiError> {
        if self.is_object(name) {
            Ok(())
        } else {
            Err(MockApiError::Schema(format!(
                "Root type '{}' is not defined as an object type",
                name
            )))
        }
    }

    /// All type definitions, extensions already merged
    pub fn types(&self) -> &[TypeDefinition] {
        &self.types
    }

    pub fn query_root(&self) -> &str {
        &self.query_root
    }

    pub fn mutation_root(&self) -> Option<&str> {
        self.mutation_root.as_deref()
    }

    /// Find a type definition by name
    pub fn find_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|t| t.name.node.as_str() == name)
    }

    pub fn is_object(&self, name: &str) -> bool {
        find_object(&self.types, name).is_some()
    }

    pub fn is_enum(&self, name: &str) -> bool {
        matches!(self.find_type(name).map(|t| &t.kind), Some(TypeKind::Enum(_)))
    }

    /// Whether `name` is a root operation type
    pub fn is_root(&self, name: &str) -> bool {
        self.query_root == name || self.mutation_root.as_deref() == Some(name)
    }

    /// Fields of an object type
    pub fn object_fields(&self, name: &str) -> Vec<&FieldDefinition> {
        find_object(&self.types, name)
            .map(|fields| fields.iter().map(|f| &f.node).collect())
            .unwrap_or_default()
    }

    /// Fields of every root operation type, i.e. the names resolvers must provide
    pub fn root_fields(&self) -> Vec<&FieldDefinition> {
        let mut fields = self.object_fields(&self.query_root);
        if let Some(mutation) = &self.mutation_root {
            fields.extend(self.object_fields(mutation));
        }
        fields
    }
}

fn find_object<'a>(
    types: &'a [TypeDefinition],
    name: &str,
) -> Option<&'a Vec<Positioned<FieldDefinition>>> {
    types.iter().find_map(|t| match &t.kind {
        TypeKind::Object(object) if t.name.node.as_str() == name => Some(&object.fields),
        _ => None,
    })
}

fn merge_type(types: &mut Vec<TypeDefinition>, definition: TypeDefinition) -> Result<(), MockApiError> {
    let name = definition.name.node.to_string();

    match &definition.kind {
        TypeKind::Interface(_) => {
            return Err(MockApiError::Schema(format!(
                "Interface '{}' is not supported",
                name
            )))
        }
        TypeKind::Union(_) => {
            return Err(MockApiError::Schema(format!(
                "Union '{}' is not supported",
                name
            )))
        }
        _ => {}
    }

    let position = types.iter().position(|t| t.name.node.as_str() == name);

    match (position, definition.extend) {
        (None, false) => {
            types.push(definition);
            Ok(())
        }
        (None, true) => Err(MockApiError::Schema(format!(
            "Cannot extend undefined type '{}'",
            name
        ))),
        (Some(_), false) => Err(MockApiError::Schema(format!(
            "Type '{}' is defined more than once",
            name
        ))),
        (Some(idx), true) => match (&mut types[idx].kind, definition.kind) {
            (TypeKind::Object(base), TypeKind::Object(extra)) => {
                base.fields.extend(extra.fields);
                Ok(())
            }
            (TypeKind::InputObject(base), TypeKind::InputObject(extra)) => {
                base.fields.extend(extra.fields);
                Ok(())
            }
            (TypeKind::Enum(base), TypeKind::Enum(extra)) => {
                base.values.extend(extra.values);
                Ok(())
            }
            _ => Err(MockApiError::Schema(format!(
                "Extension of '{}' does not match its definition",
                name
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIE_SCHEMA: &str = r#"
        type RandomDie {
          numSides: Int!
          rollOnce: Int!
          roll(numRolls: Int!): [Int]
        }

        type Query {
          getDie(numSides: Int): RandomDie
        }
    "#;

    #[test]
    fn test_parse_die_schema() {
        let doc = SchemaDocument::parse(DIE_SCHEMA).unwrap();
        assert_eq!(doc.query_root(), "Query");
        assert!(doc.mutation_root().is_none());
        assert!(doc.is_object("RandomDie"));
        assert!(!doc.is_root("RandomDie"));

        let roots: Vec<_> = doc.root_fields().iter().map(|f| f.name.node.to_string()).collect();
        assert_eq!(roots, vec!["getDie"]);
    }

    #[test]
    fn test_schema_block_roots() {
        let doc = SchemaDocument::parse(
            r#"
            schema { query: Root mutation: Change }
            type Root { a: Int }
            type Change { b(value: Int): Int }
            "#,
        )
        .unwrap();
        assert_eq!(doc.query_root(), "Root");
        assert_eq!(doc.mutation_root(), Some("Change"));
        assert_eq!(doc.root_fields().len(), 2);
    }

    #[test]
    fn test_default_mutation_root() {
        let doc = SchemaDocument::parse(
            "type Query { a: Int } type Mutation { setA(value: Int): Int }",
        )
        .unwrap();
        assert_eq!(doc.mutation_root(), Some("Mutation"));
    }

    #[test]
    fn test_extend_type_merges_fields() {
        let doc = SchemaDocument::parse(
            r#"
            type Query { a: Int }
            extend type Query { b: String }
            enum Face { ONE TWO }
            extend enum Face { THREE }
            "#,
        )
        .unwrap();
        assert_eq!(doc.object_fields("Query").len(), 2);
        assert!(doc.is_enum("Face"));
    }

    #[test]
    fn test_missing_query_root() {
        let err = SchemaDocument::parse("type Die { sides: Int }").unwrap_err();
        assert!(err.to_string().contains("Root type 'Query'"));
    }

    #[test]
    fn test_unsupported_definitions() {
        assert!(SchemaDocument::parse("interface Node { id: ID! } type Query { a: Int }").is_err());
        assert!(SchemaDocument::parse("union U = A | B type Query { a: Int }").is_err());
        assert!(SchemaDocument::parse(
            "schema { query: Query subscription: Sub } type Query { a: Int } type Sub { a: Int }"
        )
        .is_err());
    }

    #[test]
    fn test_duplicate_type() {
        let err = SchemaDocument::parse("type Query { a: Int } type Query { b: Int }").unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_syntax_error() {
        let err = SchemaDocument::parse("type Query {").unwrap_err();
        assert!(matches!(err, MockApiError::Schema(_)));
    }
}
