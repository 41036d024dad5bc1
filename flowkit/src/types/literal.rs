// Literal Values
// Typed values that cross the execution boundary between nodes

use crate::error::{FlowError, FlowResult};
use crate::types::engine::TypeTransformer;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A primitive scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl Primitive {
    pub fn simple_type(&self) -> SimpleType {
        match self {
            Primitive::Integer(_) => SimpleType::Integer,
            Primitive::Float(_) => SimpleType::Float,
            Primitive::String(_) => SimpleType::String,
            Primitive::Boolean(_) => SimpleType::Boolean,
        }
    }
}

/// A literal value: a scalar, nothing, or a nested collection/map of literals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Scalar(Primitive),
    None,
    Collection(Vec<Literal>),
    Map(BTreeMap<String, Literal>),
}

impl Literal {
    pub fn integer(value: i64) -> Self {
        Literal::Scalar(Primitive::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Literal::Scalar(Primitive::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Literal::Scalar(Primitive::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Literal::Scalar(Primitive::Boolean(value))
    }

    /// Short name of the literal's shape, used in error messages
    pub fn kind(&self) -> String {
        match self {
            Literal::Scalar(p) => p.simple_type().to_string(),
            Literal::None => "none".to_string(),
            Literal::Collection(_) => "list".to_string(),
            Literal::Map(_) => "map".to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Scalar(Primitive::Integer(i)) => write!(f, "{}", i),
            Literal::Scalar(Primitive::Float(v)) => write!(f, "{}", v),
            Literal::Scalar(Primitive::String(s)) => write!(f, "{:?}", s),
            Literal::Scalar(Primitive::Boolean(b)) => write!(f, "{}", b),
            Literal::None => write!(f, "none"),
            Literal::Collection(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Literal::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Simple (non-nested) literal types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleType {
    None,
    Integer,
    Float,
    String,
    Boolean,
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimpleType::None => "none",
            SimpleType::Integer => "integer",
            SimpleType::Float => "float",
            SimpleType::String => "string",
            SimpleType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Declared type of an interface variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralType {
    Simple(SimpleType),
    Collection(Box<LiteralType>),
    Map(Box<LiteralType>),
}

impl LiteralType {
    pub fn integer() -> Self {
        LiteralType::Simple(SimpleType::Integer)
    }

    pub fn float() -> Self {
        LiteralType::Simple(SimpleType::Float)
    }

    pub fn string() -> Self {
        LiteralType::Simple(SimpleType::String)
    }

    pub fn boolean() -> Self {
        LiteralType::Simple(SimpleType::Boolean)
    }

    pub fn none() -> Self {
        LiteralType::Simple(SimpleType::None)
    }

    pub fn list_of(inner: LiteralType) -> Self {
        LiteralType::Collection(Box::new(inner))
    }

    pub fn map_of(inner: LiteralType) -> Self {
        LiteralType::Map(Box::new(inner))
    }

    /// Check whether a literal conforms to this type
    pub fn accepts(&self, literal: &Literal) -> bool {
        match (self, literal) {
            (LiteralType::Simple(SimpleType::None), Literal::None) => true,
            (LiteralType::Simple(expected), Literal::Scalar(p)) => p.simple_type() == *expected,
            (LiteralType::Collection(inner), Literal::Collection(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (LiteralType::Map(inner), Literal::Map(map)) => {
                map.values().all(|value| inner.accepts(value))
            }
            _ => false,
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralType::Simple(simple) => write!(f, "{}", simple),
            LiteralType::Collection(inner) => write!(f, "list<{}>", inner),
            LiteralType::Map(inner) => write!(f, "map<string, {}>", inner),
        }
    }
}

/// Name-keyed literals, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiteralMap {
    literals: IndexMap<String, Literal>,
}

impl LiteralMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a native value, converting it to a literal
    pub fn with<T: TypeTransformer>(mut self, name: impl Into<String>, value: T) -> Self {
        self.literals.insert(name.into(), value.to_literal());
        self
    }

    /// Add an already converted literal
    pub fn with_literal(mut self, name: impl Into<String>, literal: Literal) -> Self {
        self.literals.insert(name.into(), literal);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, literal: Literal) -> Option<Literal> {
        self.literals.insert(name.into(), literal)
    }

    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.literals.get(name)
    }

    /// Read a literal back as a native value
    pub fn get_as<T: TypeTransformer>(&self, name: &str) -> FlowResult<T> {
        let literal = self
            .literals
            .get(name)
            .ok_or_else(|| FlowError::MissingInput(name.to_string()))?;
        T::from_literal(literal)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.literals.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.literals.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Literal)> {
        self.literals.iter()
    }
}

impl FromIterator<(String, Literal)> for LiteralMap {
    fn from_iter<I: IntoIterator<Item = (String, Literal)>>(iter: I) -> Self {
        Self {
            literals: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LiteralMap {
    type Item = (String, Literal);
    type IntoIter = indexmap::map::IntoIter<String, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_type_accepts_scalars() {
        assert!(LiteralType::integer().accepts(&Literal::integer(3)));
        assert!(!LiteralType::integer().accepts(&Literal::float(3.0)));
        assert!(LiteralType::none().accepts(&Literal::None));
        assert!(!LiteralType::string().accepts(&Literal::None));
    }

    #[test]
    fn test_literal_type_accepts_nested() {
        let list = Literal::Collection(vec![Literal::string("a"), Literal::string("b")]);
        assert!(LiteralType::list_of(LiteralType::string()).accepts(&list));
        assert!(!LiteralType::list_of(LiteralType::integer()).accepts(&list));

        // Empty collections conform to any element type
        assert!(LiteralType::list_of(LiteralType::integer()).accepts(&Literal::Collection(vec![])));

        let mut map = BTreeMap::new();
        map.insert("x".to_string(), Literal::integer(1));
        assert!(LiteralType::map_of(LiteralType::integer()).accepts(&Literal::Map(map)));
    }

    #[test]
    fn test_literal_type_display() {
        assert_eq!(LiteralType::integer().to_string(), "integer");
        assert_eq!(
            LiteralType::list_of(LiteralType::string()).to_string(),
            "list<string>"
        );
        assert_eq!(
            LiteralType::map_of(LiteralType::float()).to_string(),
            "map<string, float>"
        );
    }

    #[test]
    fn test_literal_map_preserves_order() {
        let map = LiteralMap::new()
            .with("b", 2i64)
            .with("a", "x".to_string())
            .with_literal("c", Literal::None);

        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get_as::<i64>("b").unwrap(), 2);
        assert!(matches!(
            map.get_as::<i64>("missing"),
            Err(FlowError::MissingInput(_))
        ));
    }

    #[test]
    fn test_literal_display() {
        let list = Literal::Collection(vec![Literal::string("fast-2"), Literal::integer(4)]);
        assert_eq!(list.to_string(), "[\"fast-2\", 4]");
    }
}
