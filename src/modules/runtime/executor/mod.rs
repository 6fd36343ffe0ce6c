//! GraphQL execution for one route
//!
//! A checked [`SchemaDocument`] and its resolvers are compiled into an
//! executable `async-graphql` dynamic schema. Root fields are answered by the
//! resolvers; every other object field reads the matching property of its
//! parent value, filling placeholders from its own arguments.

mod shape;

pub use shape::OutputShape;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, InputObject, InputValue, Object, ResolverContext, Scalar,
    Schema, TypeRef,
};
use async_graphql::parser::types::{
    BaseType, FieldDefinition, InputValueDefinition, Type, TypeDefinition, TypeKind,
};
use mock_api_core::MockApiError;
use mock_api_parser::{template, Resolvers, SchemaDocument};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Compiles a schema document and its resolvers into an executable schema
pub struct SchemaBuilder<'a> {
    document: &'a SchemaDocument,
    resolvers: Arc<dyn Resolvers>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(document: &'a SchemaDocument, resolvers: Arc<dyn Resolvers>) -> Self {
        Self {
            document,
            resolvers,
        }
    }

    /// Build the executable schema
    pub fn build(self) -> Result<Schema, MockApiError> {
        let mut builder = Schema::build(
            self.document.query_root(),
            self.document.mutation_root(),
            None,
        );

        for definition in self.document.types() {
            let name = definition.name.node.as_str();
            let description = description_of(definition);

            builder = match &definition.kind {
                TypeKind::Object(_) => {
                    let mut object = Object::new(name);
                    if let Some(description) = description {
                        object = object.description(description);
                    }
                    for field in self.document.object_fields(name) {
                        object = object.field(self.field(field, self.document.is_root(name)));
                    }
                    builder.register(object)
                }
                TypeKind::InputObject(input) => {
                    let mut object = InputObject::new(name);
                    if let Some(description) = description {
                        object = object.description(description);
                    }
                    for field in &input.fields {
                        object = object.field(input_value(&field.node));
                    }
                    builder.register(object)
                }
                TypeKind::Enum(values) => {
                    let mut enumeration = Enum::new(name);
                    if let Some(description) = description {
                        enumeration = enumeration.description(description);
                    }
                    for value in &values.values {
                        let mut item = EnumItem::new(value.node.value.node.as_str());
                        if let Some(description) = &value.node.description {
                            item = item.description(description.node.as_str());
                        }
                        enumeration = enumeration.item(item);
                    }
                    builder.register(enumeration)
                }
                TypeKind::Scalar => {
                    let mut scalar = Scalar::new(name);
                    if let Some(description) = description {
                        scalar = scalar.description(description);
                    }
                    builder.register(scalar)
                }
                TypeKind::Interface(_) | TypeKind::Union(_) => {
                    return Err(MockApiError::Schema(format!(
                        "Type '{}' cannot be served",
                        name
                    )))
                }
            };
        }

        builder
            .finish()
            .map_err(|e| MockApiError::Schema(e.to_string()))
    }

    fn field(&self, definition: &FieldDefinition, is_root: bool) -> Field {
        let name = definition.name.node.to_string();
        let shape = OutputShape::of(&definition.ty.node, self.document);

        let mut field = if is_root {
            let resolvers = self.resolvers.clone();
            let field_name = name.clone();
            Field::new(name.clone(), type_ref(&definition.ty.node), move |ctx| {
                let resolvers = resolvers.clone();
                let field_name = field_name.clone();
                let shape = shape.clone();
                FieldFuture::new(async move {
                    let args = arguments(&ctx)?;
                    if !resolvers.has(&field_name) {
                        return Ok(None);
                    }
                    let value = resolvers.resolve(&field_name, &args)?;
                    Ok(shape.wrap(value)?)
                })
            })
        } else {
            let field_name = name.clone();
            Field::new(name.clone(), type_ref(&definition.ty.node), move |ctx| {
                let field_name = field_name.clone();
                let shape = shape.clone();
                FieldFuture::new(async move {
                    let args = arguments(&ctx)?;
                    let parent = ctx.parent_value.try_downcast_ref::<Value>()?;
                    let value = match parent.get(&field_name) {
                        Some(raw) => template::substitute(raw, &args),
                        None => Value::Null,
                    };
                    Ok(shape.wrap(value)?)
                })
            })
        };

        if let Some(description) = &definition.description {
            field = field.description(description.node.as_str());
        }
        for argument in &definition.arguments {
            field = field.argument(input_value(&argument.node));
        }

        field
    }
}

fn description_of(definition: &TypeDefinition) -> Option<&str> {
    definition.description.as_ref().map(|d| d.node.as_str())
}

fn input_value(definition: &InputValueDefinition) -> InputValue {
    let mut value = InputValue::new(
        definition.name.node.as_str(),
        type_ref(&definition.ty.node),
    );
    if let Some(description) = &definition.description {
        value = value.description(description.node.as_str());
    }
    if let Some(default) = &definition.default_value {
        value = value.default_value(default.node.clone());
    }
    value
}

/// Translate a parsed SDL type into a dynamic schema type reference
pub fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::Named(name.to_string().into()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };

    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

fn arguments(ctx: &ResolverContext<'_>) -> Result<Map<String, Value>, MockApiError> {
    let mut args = Map::new();
    for (name, value) in ctx.args.as_index_map() {
        args.insert(name.to_string(), value.clone().into_json()?);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_api_parser::{DataFormat, DataModule};
    use serde_json::json;

    const DIE_SCHEMA: &str = r#"
        "A die with a fixed number of sides"
        type RandomDie {
          numSides: Int!
          rollOnce: Int!
          roll(numRolls: Int!): [Int]
        }

        type Query {
          getDie(numSides: Int): RandomDie
          greeting(name: String = "stranger"): String
          unanswered: String
        }
    "#;

    const DIE_DATA: &str = r#"{
        "getDie": {
            "numSides": "{{ args.numSides }}",
            "rollOnce": 4,
            "roll": ["{{ args.numRolls }}", 2]
        },
        "greeting": "Hello {{ args.name }}"
    }"#;

    fn schema(sdl: &str, data: &str) -> Schema {
        let document = SchemaDocument::parse(sdl).unwrap();
        let module = DataModule::parse(data, DataFormat::Json).unwrap();
        SchemaBuilder::new(&document, Arc::new(module)).build().unwrap()
    }

    async fn run(schema: &Schema, query: &str) -> Value {
        let response = schema.execute(query).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[tokio::test]
    async fn test_root_and_nested_arguments() {
        let schema = schema(DIE_SCHEMA, DIE_DATA);
        let data = run(
            &schema,
            "{ getDie(numSides: 6) { numSides rollOnce roll(numRolls: 3) } }",
        )
        .await;
        assert_eq!(
            data,
            json!({"getDie": {"numSides": 6, "rollOnce": 4, "roll": [3, 2]}})
        );
    }

    #[tokio::test]
    async fn test_argument_text_is_returned_verbatim() {
        let schema = schema(
            r#"
            type Greeter { message(suffix: String): String }
            type Query { greeter(name: String): Greeter }
            "#,
            r#"{"greeter": {"message": "Hi {{ args.name }}{{ args.suffix }}"}}"#,
        );
        let data = run(
            &schema,
            r#"{ greeter(name: "{{ args.suffix }}") { message(suffix: "!") } }"#,
        )
        .await;
        assert_eq!(data, json!({"greeter": {"message": "Hi {{ args.suffix }}!"}}));
    }

    #[tokio::test]
    async fn test_default_argument_value() {
        let schema = schema(DIE_SCHEMA, DIE_DATA);
        let data = run(&schema, "{ greeting }").await;
        assert_eq!(data, json!({"greeting": "Hello stranger"}));

        let data = run(&schema, r#"{ greeting(name: "Ada") }"#).await;
        assert_eq!(data, json!({"greeting": "Hello Ada"}));
    }

    #[tokio::test]
    async fn test_missing_resolver_is_null() {
        let schema = schema(DIE_SCHEMA, DIE_DATA);
        let data = run(&schema, "{ unanswered }").await;
        assert_eq!(data, json!({"unanswered": null}));
    }

    #[tokio::test]
    async fn test_unfilled_placeholder_on_non_null_field_errors() {
        let schema = schema(DIE_SCHEMA, DIE_DATA);
        let response = schema.execute("{ getDie { numSides } }").await;
        assert!(!response.errors.is_empty());
    }

    #[tokio::test]
    async fn test_enum_and_list_values() {
        let schema = schema(
            r#"
            enum Face { HEADS TAILS }
            type Flip { face: Face! }
            type Query { flips: [Flip!]! faces: [Face] }
            "#,
            r#"{"flips": [{"face": "HEADS"}, {"face": "TAILS"}], "faces": ["TAILS", null]}"#,
        );
        let data = run(&schema, "{ flips { face } faces }").await;
        assert_eq!(
            data,
            json!({"flips": [{"face": "HEADS"}, {"face": "TAILS"}], "faces": ["TAILS", null]})
        );
    }

    #[tokio::test]
    async fn test_mutation_root() {
        let schema = schema(
            "type Query { ok: Boolean } type Mutation { setMessage(message: String!): String }",
            r#"{"ok": true, "setMessage": "{{ args.message }}"}"#,
        );
        let data = run(&schema, r#"mutation { setMessage(message: "saved") }"#).await;
        assert_eq!(data, json!({"setMessage": "saved"}));
    }

    #[tokio::test]
    async fn test_input_object_argument() {
        let schema = schema(
            r#"
            input RollInput { sides: Int! times: Int = 1 }
            type Query { describe(input: RollInput!): String }
            "#,
            r#"{"describe": "Rolling {{ args.input }}"}"#,
        );
        let data = run(&schema, "{ describe(input: { sides: 20, times: 2 }) }").await;
        assert_eq!(
            data,
            json!({"describe": r#"Rolling {"sides":20,"times":2}"#})
        );
    }

    #[tokio::test]
    async fn test_custom_scalar() {
        let schema = schema(
            "scalar Date type Query { today: Date }",
            r#"{"today": "2024-01-01"}"#,
        );
        let data = run(&schema, "{ today }").await;
        assert_eq!(data, json!({"today": "2024-01-01"}));
    }

    #[test]
    fn test_type_ref() {
        let document = SchemaDocument::parse("type Query { a: [Int!]! }").unwrap();
        let field = document.root_fields()[0];
        assert_eq!(type_ref(&field.ty.node).to_string(), "[Int!]!");
    }
}
