// Call Bindings
// Arguments passed into entity calls and the outputs handed back

use crate::error::{FlowError, FlowResult};
use crate::models::{Binding, BindingData, OutputReference};
use crate::types::{Literal, LiteralMap, LiteralType, TypeTransformer};

use indexmap::IndexMap;

/// Anything that can be bound to an entity input or output
pub trait IntoBinding {
    fn into_binding(self) -> BindingData;
}

impl<T: TypeTransformer> IntoBinding for T {
    fn into_binding(self) -> BindingData {
        BindingData::Scalar(self.to_literal())
    }
}

impl IntoBinding for BindingData {
    fn into_binding(self) -> BindingData {
        self
    }
}

impl IntoBinding for OutputReference {
    fn into_binding(self) -> BindingData {
        BindingData::Promise(self)
    }
}

impl IntoBinding for Literal {
    fn into_binding(self) -> BindingData {
        BindingData::Scalar(self)
    }
}

/// Named bindings, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: IndexMap<String, BindingData>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V: IntoBinding>(mut self, name: impl Into<String>, value: V) -> Self {
        self.values.insert(name.into(), value.into_binding());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl IntoBinding) {
        self.values.insert(name.into(), value.into_binding());
    }

    pub fn get(&self, name: &str) -> Option<&BindingData> {
        self.values.get(name)
    }

    /// Binding for a name, or a missing-input error
    pub fn require(&self, name: &str) -> FlowResult<&BindingData> {
        self.values
            .get(name)
            .ok_or_else(|| FlowError::MissingInput(name.to_string()))
    }

    /// Read a binding as a native value; only works once it is resolved
    pub fn get_as<T: TypeTransformer>(&self, name: &str) -> FlowResult<T> {
        T::from_literal(&self.require(name)?.to_literal()?)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BindingData)> {
        self.values.iter()
    }

    /// Resolve every binding into a literal map
    pub fn to_literal_map(&self) -> FlowResult<LiteralMap> {
        self.values
            .iter()
            .map(|(name, data)| data.to_literal().map(|lit| (name.clone(), lit)))
            .collect()
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.values
            .into_iter()
            .map(|(var, binding)| Binding { var, binding })
            .collect()
    }

    /// Check bindings against declared variables.
    ///
    /// `missing` and `unexpected` build the error for absent and extra names.
    pub(crate) fn check_against(
        &self,
        declared: &IndexMap<String, LiteralType>,
        missing: fn(String) -> FlowError,
        unexpected: fn(String) -> FlowError,
    ) -> FlowResult<()> {
        for (name, expected) in declared {
            let data = self.values.get(name).ok_or_else(|| missing(name.clone()))?;
            if !data.conforms_to(expected) {
                return Err(FlowError::type_mismatch(name, expected, data.kind()));
            }
        }

        if let Some(extra) = self.names().find(|n| !declared.contains_key(*n)) {
            return Err(unexpected(extra.to_string()));
        }

        Ok(())
    }
}

impl From<&LiteralMap> for Bindings {
    fn from(map: &LiteralMap) -> Self {
        Self {
            values: map
                .iter()
                .map(|(name, lit)| (name.clone(), BindingData::Scalar(lit.clone())))
                .collect(),
        }
    }
}

impl FromIterator<(String, BindingData)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, BindingData)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Outputs of a call: literals when run locally, promises when compiled
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutputs {
    node_id: Option<String>,
    outputs: IndexMap<String, BindingData>,
}

impl NodeOutputs {
    pub(crate) fn resolved(outputs: LiteralMap) -> Self {
        Self {
            node_id: None,
            outputs: outputs
                .into_iter()
                .map(|(name, lit)| (name, BindingData::Scalar(lit)))
                .collect(),
        }
    }

    pub(crate) fn promised(node_id: String, outputs: IndexMap<String, BindingData>) -> Self {
        Self {
            node_id: Some(node_id),
            outputs,
        }
    }

    /// Id of the recorded node, if the call was compiled
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn output(&self, name: &str) -> FlowResult<BindingData> {
        self.outputs
            .get(name)
            .cloned()
            .ok_or_else(|| FlowError::MissingOutput(name.to_string()))
    }

    pub fn get_as<T: TypeTransformer>(&self, name: &str) -> FlowResult<T> {
        T::from_literal(&self.output(name)?.to_literal()?)
    }

    pub fn into_bindings(self) -> Bindings {
        self.outputs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_converts_native_values() {
        let bindings = Bindings::new()
            .with("a", 5i64)
            .with("names", vec!["x".to_string()])
            .with("raw", Literal::None);

        assert_eq!(bindings.get_as::<i64>("a").unwrap(), 5);
        assert_eq!(
            bindings.to_literal_map().unwrap().get("names"),
            Some(&Literal::Collection(vec![Literal::string("x")]))
        );
        assert_eq!(bindings.get("raw"), Some(&BindingData::Scalar(Literal::None)));
    }

    #[test]
    fn test_promises_do_not_resolve() {
        let reference = OutputReference {
            node_id: "n0".to_string(),
            var: "o0".to_string(),
            literal_type: LiteralType::integer(),
        };
        let bindings = Bindings::new().with("a", reference);

        assert!(matches!(
            bindings.get_as::<i64>("a"),
            Err(FlowError::UnresolvedPromise(_))
        ));
        assert!(bindings.to_literal_map().is_err());
    }

    #[test]
    fn test_check_against_declared() {
        let mut declared = IndexMap::new();
        declared.insert("a".to_string(), LiteralType::integer());

        let ok = Bindings::new().with("a", 1i64);
        assert!(ok
            .check_against(&declared, FlowError::MissingInput, FlowError::UnexpectedInput)
            .is_ok());

        let wrong = Bindings::new().with("a", "x".to_string());
        assert!(matches!(
            wrong.check_against(&declared, FlowError::MissingInput, FlowError::UnexpectedInput),
            Err(FlowError::TypeMismatch { .. })
        ));

        let extra = Bindings::new().with("a", 1i64).with("b", 2i64);
        assert!(matches!(
            extra.check_against(&declared, FlowError::MissingInput, FlowError::UnexpectedInput),
            Err(FlowError::UnexpectedInput(name)) if name == "b"
        ));
    }

    #[test]
    fn test_resolved_outputs() {
        let outputs = NodeOutputs::resolved(LiteralMap::new().with("o0", "fast-2".to_string()));
        assert!(outputs.node_id().is_none());
        assert_eq!(outputs.get_as::<String>("o0").unwrap(), "fast-2");
        assert!(matches!(outputs.output("o1"), Err(FlowError::MissingOutput(_))));
    }
}
