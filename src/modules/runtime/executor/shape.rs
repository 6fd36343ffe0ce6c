//! Mapping resolved JSON values onto GraphQL output types

use async_graphql::dynamic::FieldValue;
use async_graphql::parser::types::{BaseType, Type};
use async_graphql::{Name, Value as GqlValue};
use mock_api_core::MockApiError;
use mock_api_parser::{template, SchemaDocument};
use serde_json::Value;

/// How a field's JSON value is handed to the GraphQL engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputShape {
    /// Scalar or enum leaf
    Leaf { is_enum: bool },
    /// Object type; the JSON object becomes the parent of its fields
    Object,
    /// List of the inner shape
    List(Box<OutputShape>),
}

impl OutputShape {
    /// Derive the shape of a field type
    pub fn of(ty: &Type, schema: &SchemaDocument) -> Self {
        match &ty.base {
            BaseType::List(inner) => OutputShape::List(Box::new(Self::of(inner, schema))),
            BaseType::Named(name) if schema.is_object(name.as_str()) => OutputShape::Object,
            BaseType::Named(name) => OutputShape::Leaf {
                is_enum: schema.is_enum(name.as_str()),
            },
        }
    }

    /// Wrap a resolved value; `None` is GraphQL null
    pub fn wrap<'a>(&self, value: Value) -> Result<Option<FieldValue<'a>>, MockApiError> {
        if value.is_null() {
            return Ok(None);
        }

        match self {
            OutputShape::Leaf { is_enum } => {
                let value = template::finish_leaf(value);
                match value {
                    Value::Null => Ok(None),
                    Value::String(s) if *is_enum => {
                        Ok(Some(FieldValue::value(GqlValue::Enum(Name::new(s)))))
                    }
                    other => Ok(Some(FieldValue::value(GqlValue::from_json(other)?))),
                }
            }
            OutputShape::Object => match value {
                Value::Object(_) => Ok(Some(FieldValue::owned_any(value))),
                other => Err(MockApiError::Resolver(format!(
                    "Expected an object, found {}",
                    other
                ))),
            },
            OutputShape::List(inner) => match value {
                Value::Array(items) => {
                    let items = items
                        .into_iter()
                        .map(|item| Ok(inner.wrap(item)?.unwrap_or(FieldValue::NULL)))
                        .collect::<Result<Vec<_>, MockApiError>>()?;
                    Ok(Some(FieldValue::list(items)))
                }
                other => Err(MockApiError::Resolver(format!(
                    "Expected a list, found {}",
                    other
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaDocument {
        SchemaDocument::parse(
            r#"
            enum Face { HEADS TAILS }
            type Coin { face: Face }
            type Query { coin: Coin coins: [Coin!]! faces: [Face] count: Int }
            "#,
        )
        .unwrap()
    }

    fn field_shape(name: &str) -> OutputShape {
        let schema = schema();
        let field = schema
            .root_fields()
            .into_iter()
            .find(|f| f.name.node.as_str() == name)
            .unwrap()
            .clone();
        OutputShape::of(&field.ty.node, &schema)
    }

    #[test]
    fn test_shapes() {
        assert_eq!(field_shape("coin"), OutputShape::Object);
        assert_eq!(
            field_shape("coins"),
            OutputShape::List(Box::new(OutputShape::Object))
        );
        assert_eq!(
            field_shape("faces"),
            OutputShape::List(Box::new(OutputShape::Leaf { is_enum: true }))
        );
        assert_eq!(field_shape("count"), OutputShape::Leaf { is_enum: false });
    }

    #[test]
    fn test_wrap_null_and_unresolved() {
        let leaf = OutputShape::Leaf { is_enum: false };
        assert!(leaf.wrap(Value::Null).unwrap().is_none());
        assert!(leaf.wrap(json!("{{ args.missing }}")).unwrap().is_none());
        assert!(leaf.wrap(json!(4)).unwrap().is_some());
    }

    #[test]
    fn test_wrap_type_mismatch() {
        assert!(OutputShape::Object.wrap(json!(3)).is_err());
        let list = OutputShape::List(Box::new(OutputShape::Leaf { is_enum: false }));
        assert!(list.wrap(json!({"a": 1})).is_err());
        assert!(list.wrap(json!([1, null, 3])).unwrap().is_some());
    }
}
