// Type Engine
// Converts between native Rust values, JSON documents and literals

use crate::error::{FlowError, FlowResult};
use crate::types::interface::TypedInterface;
use crate::types::literal::{Literal, LiteralMap, LiteralType, Primitive, SimpleType};

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Conversion between a native type and its literal representation
pub trait TypeTransformer: Sized {
    /// Declared literal type for this native type
    fn literal_type() -> LiteralType;

    fn to_literal(&self) -> Literal;

    fn from_literal(literal: &Literal) -> FlowResult<Self>;
}

impl TypeTransformer for i64 {
    fn literal_type() -> LiteralType {
        LiteralType::integer()
    }

    fn to_literal(&self) -> Literal {
        Literal::integer(*self)
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        match literal {
            Literal::Scalar(Primitive::Integer(i)) => Ok(*i),
            other => Err(conversion_error("integer", other)),
        }
    }
}

impl TypeTransformer for i32 {
    fn literal_type() -> LiteralType {
        LiteralType::integer()
    }

    fn to_literal(&self) -> Literal {
        Literal::integer(i64::from(*self))
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        let wide = i64::from_literal(literal)?;
        i32::try_from(wide)
            .map_err(|_| FlowError::Conversion(format!("{} does not fit in a 32-bit integer", wide)))
    }
}

impl TypeTransformer for f64 {
    fn literal_type() -> LiteralType {
        LiteralType::float()
    }

    fn to_literal(&self) -> Literal {
        Literal::float(*self)
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        match literal {
            Literal::Scalar(Primitive::Float(v)) => Ok(*v),
            other => Err(conversion_error("float", other)),
        }
    }
}

impl TypeTransformer for bool {
    fn literal_type() -> LiteralType {
        LiteralType::boolean()
    }

    fn to_literal(&self) -> Literal {
        Literal::boolean(*self)
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        match literal {
            Literal::Scalar(Primitive::Boolean(b)) => Ok(*b),
            other => Err(conversion_error("boolean", other)),
        }
    }
}

impl TypeTransformer for String {
    fn literal_type() -> LiteralType {
        LiteralType::string()
    }

    fn to_literal(&self) -> Literal {
        Literal::string(self.clone())
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        match literal {
            Literal::Scalar(Primitive::String(s)) => Ok(s.clone()),
            other => Err(conversion_error("string", other)),
        }
    }
}

impl<T: TypeTransformer> TypeTransformer for Vec<T> {
    fn literal_type() -> LiteralType {
        LiteralType::list_of(T::literal_type())
    }

    fn to_literal(&self) -> Literal {
        Literal::Collection(self.iter().map(T::to_literal).collect())
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        match literal {
            Literal::Collection(items) => items.iter().map(T::from_literal).collect(),
            other => Err(conversion_error("list", other)),
        }
    }
}

impl<T: TypeTransformer> TypeTransformer for BTreeMap<String, T> {
    fn literal_type() -> LiteralType {
        LiteralType::map_of(T::literal_type())
    }

    fn to_literal(&self) -> Literal {
        Literal::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_literal()))
                .collect(),
        )
    }

    fn from_literal(literal: &Literal) -> FlowResult<Self> {
        match literal {
            Literal::Map(map) => map
                .iter()
                .map(|(k, v)| T::from_literal(v).map(|native| (k.clone(), native)))
                .collect(),
            other => Err(conversion_error("map", other)),
        }
    }
}

fn conversion_error(expected: &str, found: &Literal) -> FlowError {
    FlowError::Conversion(format!("expected {}, found {}", expected, found.kind()))
}

/// Entry point for literal conversions that are not tied to a native type
pub struct TypeEngine;

impl TypeEngine {
    pub fn to_literal<T: TypeTransformer>(value: &T) -> Literal {
        value.to_literal()
    }

    pub fn to_native<T: TypeTransformer>(literal: &Literal) -> FlowResult<T> {
        T::from_literal(literal)
    }

    /// Build a literal map from a JSON object.
    ///
    /// When an interface is supplied, each value is converted to the declared
    /// input type and unknown names are rejected. Otherwise the literal type is
    /// guessed from the JSON value.
    pub fn dict_to_literal_map(
        values: &JsonValue,
        declared: Option<&TypedInterface>,
    ) -> FlowResult<LiteralMap> {
        let object = values.as_object().ok_or_else(|| {
            FlowError::Conversion(format!("expected a JSON object, found {}", json_kind(values)))
        })?;

        let mut map = LiteralMap::new();
        for (name, value) in object {
            let literal = match declared {
                Some(interface) => {
                    let expected = interface
                        .input_type(name)
                        .ok_or_else(|| FlowError::UnexpectedInput(name.clone()))?;
                    Self::json_to_typed_literal(name, value, expected)?
                }
                None => Self::json_to_literal(value),
            };
            map.insert(name.clone(), literal);
        }

        Ok(map)
    }

    /// Guess a literal from an untyped JSON value
    pub fn json_to_literal(value: &JsonValue) -> Literal {
        match value {
            JsonValue::Null => Literal::None,
            JsonValue::Bool(b) => Literal::boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Literal::integer(i),
                None => Literal::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Literal::string(s.clone()),
            JsonValue::Array(items) => {
                Literal::Collection(items.iter().map(Self::json_to_literal).collect())
            }
            JsonValue::Object(map) => Literal::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::json_to_literal(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a JSON value into a literal of a declared type
    pub fn json_to_typed_literal(
        name: &str,
        value: &JsonValue,
        expected: &LiteralType,
    ) -> FlowResult<Literal> {
        let mismatch = || FlowError::type_mismatch(name, expected, json_kind(value));

        match (expected, value) {
            (LiteralType::Simple(SimpleType::None), JsonValue::Null) => Ok(Literal::None),
            (LiteralType::Simple(SimpleType::Integer), JsonValue::Number(n)) => {
                n.as_i64().map(Literal::integer).ok_or_else(mismatch)
            }
            // Integers widen to floats
            (LiteralType::Simple(SimpleType::Float), JsonValue::Number(n)) => {
                n.as_f64().map(Literal::float).ok_or_else(mismatch)
            }
            (LiteralType::Simple(SimpleType::String), JsonValue::String(s)) => {
                Ok(Literal::string(s.clone()))
            }
            (LiteralType::Simple(SimpleType::Boolean), JsonValue::Bool(b)) => {
                Ok(Literal::boolean(*b))
            }
            (LiteralType::Collection(inner), JsonValue::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Self::json_to_typed_literal(&format!("{}[{}]", name, i), item, inner))
                .collect::<FlowResult<Vec<_>>>()
                .map(Literal::Collection),
            (LiteralType::Map(inner), JsonValue::Object(map)) => map
                .iter()
                .map(|(k, v)| {
                    Self::json_to_typed_literal(&format!("{}.{}", name, k), v, inner)
                        .map(|lit| (k.clone(), lit))
                })
                .collect::<FlowResult<BTreeMap<_, _>>>()
                .map(Literal::Map),
            _ => Err(mismatch()),
        }
    }

    pub fn literal_to_json(literal: &Literal) -> JsonValue {
        match literal {
            Literal::Scalar(Primitive::Integer(i)) => JsonValue::from(*i),
            Literal::Scalar(Primitive::Float(v)) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Literal::Scalar(Primitive::String(s)) => JsonValue::String(s.clone()),
            Literal::Scalar(Primitive::Boolean(b)) => JsonValue::Bool(*b),
            Literal::None => JsonValue::Null,
            Literal::Collection(items) => {
                JsonValue::Array(items.iter().map(Self::literal_to_json).collect())
            }
            Literal::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::literal_to_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn literal_map_to_json(map: &LiteralMap) -> JsonValue {
        JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Self::literal_to_json(v)))
                .collect(),
        )
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
