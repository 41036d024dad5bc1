// Typed Interfaces
// Declared inputs and outputs of tasks and workflows

use crate::error::{FlowError, FlowResult};
use crate::types::literal::{LiteralMap, LiteralType};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered input and output variables of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedInterface {
    pub inputs: IndexMap<String, LiteralType>,
    pub outputs: IndexMap<String, LiteralType>,
}

impl TypedInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: impl Into<String>, literal_type: LiteralType) -> Self {
        self.inputs.insert(name.into(), literal_type);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, literal_type: LiteralType) -> Self {
        self.outputs.insert(name.into(), literal_type);
        self
    }

    pub fn input_type(&self, name: &str) -> Option<&LiteralType> {
        self.inputs.get(name)
    }

    pub fn output_type(&self, name: &str) -> Option<&LiteralType> {
        self.outputs.get(name)
    }

    /// Check that a literal map supplies exactly the declared inputs
    pub fn validate_inputs(&self, inputs: &LiteralMap) -> FlowResult<()> {
        for (name, expected) in &self.inputs {
            let literal = inputs
                .get(name)
                .ok_or_else(|| FlowError::MissingInput(name.clone()))?;
            if !expected.accepts(literal) {
                return Err(FlowError::type_mismatch(name, expected, literal.kind()));
            }
        }

        if let Some(extra) = inputs.names().find(|n| !self.inputs.contains_key(*n)) {
            return Err(FlowError::UnexpectedInput(extra.to_string()));
        }

        Ok(())
    }

    /// Check that a literal map holds exactly the declared outputs
    pub fn validate_outputs(&self, outputs: &LiteralMap) -> FlowResult<()> {
        for (name, expected) in &self.outputs {
            let literal = outputs
                .get(name)
                .ok_or_else(|| FlowError::MissingOutput(name.clone()))?;
            if !expected.accepts(literal) {
                return Err(FlowError::type_mismatch(name, expected, literal.kind()));
            }
        }

        if let Some(extra) = outputs.names().find(|n| !self.outputs.contains_key(*n)) {
            return Err(FlowError::UnexpectedOutput(extra.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::literal::Literal;

    fn interface() -> TypedInterface {
        TypedInterface::new()
            .with_input("a", LiteralType::integer())
            .with_output("o0", LiteralType::string())
    }

    #[test]
    fn test_validate_inputs_ok() {
        let inputs = LiteralMap::new().with("a", 5i64);
        assert!(interface().validate_inputs(&inputs).is_ok());
    }

    #[test]
    fn test_validate_inputs_missing() {
        let err = interface().validate_inputs(&LiteralMap::new()).unwrap_err();
        assert!(matches!(err, FlowError::MissingInput(name) if name == "a"));
    }

    #[test]
    fn test_validate_inputs_wrong_type() {
        let inputs = LiteralMap::new().with("a", "five".to_string());
        let err = interface().validate_inputs(&inputs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type mismatch for 'a': expected integer, found string"
        );
    }

    #[test]
    fn test_validate_inputs_unexpected() {
        let inputs = LiteralMap::new().with("a", 1i64).with("b", 2i64);
        let err = interface().validate_inputs(&inputs).unwrap_err();
        assert!(matches!(err, FlowError::UnexpectedInput(name) if name == "b"));
    }

    #[test]
    fn test_validate_outputs() {
        let outputs = LiteralMap::new().with_literal("o0", Literal::string("fast-2"));
        assert!(interface().validate_outputs(&outputs).is_ok());

        let err = interface()
            .validate_outputs(&LiteralMap::new())
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingOutput(_)));
    }
}
