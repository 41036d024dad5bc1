// Type System
// Literals, typed interfaces and native conversions

pub mod engine;
pub mod interface;
pub mod literal;

// Re-export key types
pub use engine::{TypeEngine, TypeTransformer};
pub use interface::TypedInterface;
pub use literal::{Literal, LiteralMap, LiteralType, Primitive, SimpleType};
