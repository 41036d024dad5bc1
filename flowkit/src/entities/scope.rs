// Node Scope
// Intercepts entity calls made from workflow and dynamic bodies

use crate::context::FlowContext;
use crate::entities::binding::{Bindings, NodeOutputs};
use crate::entities::entity::{Entity, EntityCollector};
use crate::error::{FlowError, FlowResult};
use crate::models::{BindingData, Node, NodeMetadata, OutputReference, START_NODE_ID};

use indexmap::IndexMap;
use tracing::debug;

/// Node id prefix for nodes recorded inside a dynamic task
pub const DYNAMIC_NODE_PREFIX: &str = "dn";

/// Node id prefix for nodes recorded inside a workflow
pub const WORKFLOW_NODE_PREFIX: &str = "n";

enum ScopeMode<'a> {
    /// Calls run immediately and return literals
    Local,
    /// Calls are recorded as nodes and return promises
    Compile(CompileState<'a>),
}

struct CompileState<'a> {
    prefix: &'static str,
    nodes: Vec<Node>,
    collector: &'a mut EntityCollector,
}

/// Handed to workflow and dynamic bodies; every child call goes through it
pub struct NodeScope<'a> {
    ctx: &'a FlowContext,
    mode: ScopeMode<'a>,
}

impl<'a> NodeScope<'a> {
    /// A scope whose calls execute in-process
    pub fn local(ctx: &'a FlowContext) -> Self {
        Self {
            ctx,
            mode: ScopeMode::Local,
        }
    }

    /// A scope whose calls are recorded as nodes named `<prefix><index>`
    pub fn compiling(
        ctx: &'a FlowContext,
        prefix: &'static str,
        collector: &'a mut EntityCollector,
    ) -> Self {
        Self {
            ctx,
            mode: ScopeMode::Compile(CompileState {
                prefix,
                nodes: Vec::new(),
                collector,
            }),
        }
    }

    pub fn context(&self) -> &FlowContext {
        self.ctx
    }

    pub fn is_compiling(&self) -> bool {
        matches!(self.mode, ScopeMode::Compile(_))
    }

    /// Number of nodes recorded so far
    pub fn node_count(&self) -> usize {
        match &self.mode {
            ScopeMode::Local => 0,
            ScopeMode::Compile(state) => state.nodes.len(),
        }
    }

    /// Call an entity with the given arguments
    pub fn call(&mut self, entity: &dyn Entity, args: Bindings) -> FlowResult<NodeOutputs> {
        args.check_against(
            &entity.interface().inputs,
            FlowError::MissingInput,
            FlowError::UnexpectedInput,
        )?;

        match &mut self.mode {
            ScopeMode::Local => {
                let inputs = args.to_literal_map()?;
                debug!(entity = %entity.qualified_name(), "executing call locally");
                let outputs = entity.execute_local(self.ctx, &inputs)?;
                Ok(NodeOutputs::resolved(outputs))
            }
            ScopeMode::Compile(state) => {
                let target = entity.compile_into(self.ctx, &mut *state.collector)?;
                let node_id = format!("{}{}", state.prefix, state.nodes.len());

                let outputs: IndexMap<String, BindingData> = entity
                    .interface()
                    .outputs
                    .iter()
                    .map(|(var, literal_type)| {
                        let reference = OutputReference {
                            node_id: node_id.clone(),
                            var: var.clone(),
                            literal_type: literal_type.clone(),
                        };
                        (var.clone(), BindingData::Promise(reference))
                    })
                    .collect();

                let upstream_node_ids = upstream_ids(&args);
                debug!(
                    node_id = %node_id,
                    entity = %entity.qualified_name(),
                    upstream = upstream_node_ids.len(),
                    "recorded node"
                );

                state.nodes.push(Node {
                    id: node_id.clone(),
                    metadata: NodeMetadata {
                        name: entity.qualified_name(),
                        retries: entity.retries(),
                    },
                    inputs: args.into_bindings(),
                    upstream_node_ids,
                    target,
                });

                Ok(NodeOutputs::promised(node_id, outputs))
            }
        }
    }

    /// Recorded nodes in call order; empty for local scopes
    pub fn into_nodes(self) -> Vec<Node> {
        match self.mode {
            ScopeMode::Local => Vec::new(),
            ScopeMode::Compile(state) => state.nodes,
        }
    }
}

/// Ids of nodes whose outputs feed these arguments, first-seen order, without the start node
fn upstream_ids(args: &Bindings) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for (_, data) in args.iter() {
        for reference in data.promises() {
            if reference.node_id != START_NODE_ID && !ids.contains(&reference.node_id) {
                ids.push(reference.node_id.clone());
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Image, ImageConfig, SerializationSettings};
    use crate::entities::task::FunctionTask;
    use crate::models::NodeTarget;
    use crate::types::{LiteralMap, LiteralType};

    fn increment() -> FunctionTask {
        FunctionTask::builder("scope_tests", "increment")
            .input("x", LiteralType::integer())
            .output("o0", LiteralType::integer())
            .function(|inputs| {
                let x: i64 = inputs.get_as("x")?;
                Ok(LiteralMap::new().with("o0", x + 1))
            })
    }

    fn compile_ctx() -> FlowContext {
        FlowContext::new().with_serialization_settings(SerializationSettings::new(
            "p",
            "d",
            "v",
            ImageConfig::new(Image::new("default", "app", "v1")),
        ))
    }

    #[test]
    fn test_local_call_returns_literals() {
        let ctx = FlowContext::new();
        let task = increment();
        let mut scope = NodeScope::local(&ctx);

        let outputs = scope.call(&task, Bindings::new().with("x", 1i64)).unwrap();
        assert_eq!(outputs.get_as::<i64>("o0").unwrap(), 2);
        assert_eq!(scope.node_count(), 0);
        assert!(scope.into_nodes().is_empty());
    }

    #[test]
    fn test_compiled_calls_chain_promises() {
        let ctx = compile_ctx();
        let task = increment();
        let mut collector = EntityCollector::new();
        let mut scope = NodeScope::compiling(&ctx, WORKFLOW_NODE_PREFIX, &mut collector);

        let first = scope.call(&task, Bindings::new().with("x", 1i64)).unwrap();
        assert_eq!(first.node_id(), Some("n0"));

        let second = scope
            .call(&task, Bindings::new().with("x", first.output("o0").unwrap()))
            .unwrap();
        assert_eq!(second.node_id(), Some("n1"));

        let nodes = scope.into_nodes();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].upstream_node_ids.is_empty());
        assert_eq!(nodes[1].upstream_node_ids, vec!["n0".to_string()]);
        assert_eq!(nodes[1].metadata.name, "scope_tests.increment");
        assert!(matches!(&nodes[0].target, NodeTarget::Task(id) if id.name == "scope_tests.increment"));

        // Same task called twice is collected once
        assert_eq!(collector.task_count(), 1);
    }

    #[test]
    fn test_call_rejects_bad_arguments() {
        let ctx = FlowContext::new();
        let task = increment();
        let mut scope = NodeScope::local(&ctx);

        let err = scope
            .call(&task, Bindings::new().with("x", "one".to_string()))
            .unwrap_err();
        assert!(matches!(err, FlowError::TypeMismatch { .. }));

        let err = scope.call(&task, Bindings::new()).unwrap_err();
        assert!(matches!(err, FlowError::MissingInput(name) if name == "x"));
    }

    #[test]
    fn test_compile_requires_settings() {
        let ctx = FlowContext::new();
        let task = increment();
        let mut collector = EntityCollector::new();
        let mut scope = NodeScope::compiling(&ctx, DYNAMIC_NODE_PREFIX, &mut collector);

        let err = scope
            .call(&task, Bindings::new().with("x", 1i64))
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingSerializationSettings(_)));
    }
}
