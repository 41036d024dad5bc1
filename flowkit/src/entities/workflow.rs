// Workflows
// Static graphs of entity calls, run in-process or compiled into a closure

use crate::context::{ExecutionMode, FlowContext};
use crate::entities::binding::Bindings;
use crate::entities::entity::{DispatchOutput, Entity, EntityCollector, EntityKind};
use crate::entities::scope::{NodeScope, WORKFLOW_NODE_PREFIX};
use crate::error::{FlowError, FlowResult};
use crate::models::{
    BindingData, Identifier, Node, NodeTarget, OutputReference, ResourceType, WorkflowClosure,
    WorkflowSpec, START_NODE_ID,
};
use crate::types::{LiteralMap, LiteralType, TypedInterface};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Body of a workflow. Inputs arrive as literals when run locally and as
/// start-node promises when compiled.
pub type WorkflowFunction =
    Arc<dyn Fn(&mut NodeScope<'_>, &Bindings) -> FlowResult<Bindings> + Send + Sync>;

/// Builder for workflows
pub struct WorkflowBuilder {
    module: String,
    name: String,
    interface: TypedInterface,
}

impl WorkflowBuilder {
    pub fn input(mut self, name: impl Into<String>, literal_type: LiteralType) -> Self {
        self.interface.inputs.insert(name.into(), literal_type);
        self
    }

    pub fn output(mut self, name: impl Into<String>, literal_type: LiteralType) -> Self {
        self.interface.outputs.insert(name.into(), literal_type);
        self
    }

    pub fn body<F>(self, function: F) -> Workflow
    where
        F: Fn(&mut NodeScope<'_>, &Bindings) -> FlowResult<Bindings> + Send + Sync + 'static,
    {
        Workflow {
            module: self.module,
            name: self.name,
            interface: self.interface,
            function: Arc::new(function),
        }
    }
}

#[derive(Clone)]
pub struct Workflow {
    module: String,
    name: String,
    interface: TypedInterface,
    function: WorkflowFunction,
}

impl Workflow {
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder {
            module: module.into(),
            name: name.into(),
            interface: TypedInterface::new(),
        }
    }

    /// Compile into a closure holding the graph and everything it references
    pub fn compile(&self, ctx: &FlowContext) -> FlowResult<WorkflowClosure> {
        let mut collector = EntityCollector::new();
        let workflow = self.compile_spec(ctx, &mut collector)?;
        let (tasks, subworkflows) = collector.into_parts();

        info!(
            workflow = %self.qualified_name(),
            nodes = workflow.nodes.len(),
            tasks = tasks.len(),
            "compiled workflow"
        );

        Ok(WorkflowClosure {
            workflow,
            tasks,
            subworkflows,
        })
    }

    fn compile_spec(
        &self,
        ctx: &FlowContext,
        collector: &mut EntityCollector,
    ) -> FlowResult<WorkflowSpec> {
        let settings = ctx
            .serialization_settings()
            .ok_or_else(|| FlowError::MissingSerializationSettings(self.qualified_name()))?;
        let id = Identifier::new(ResourceType::Workflow, settings, self.qualified_name());

        let inputs: Bindings = self
            .interface
            .inputs
            .iter()
            .map(|(var, literal_type)| {
                let reference = OutputReference {
                    node_id: START_NODE_ID.to_string(),
                    var: var.clone(),
                    literal_type: literal_type.clone(),
                };
                (var.clone(), BindingData::Promise(reference))
            })
            .collect();

        let (nodes, outputs) = self.trace(ctx, &inputs, collector)?;

        Ok(WorkflowSpec {
            id,
            interface: self.interface.clone(),
            nodes,
            outputs: outputs.into_bindings(),
        })
    }

    fn trace(
        &self,
        ctx: &FlowContext,
        inputs: &Bindings,
        collector: &mut EntityCollector,
    ) -> FlowResult<(Vec<Node>, Bindings)> {
        let mut scope = NodeScope::compiling(ctx, WORKFLOW_NODE_PREFIX, collector);
        let outputs = (self.function)(&mut scope, inputs)?;
        outputs.check_against(
            &self.interface.outputs,
            FlowError::MissingOutput,
            FlowError::UnexpectedOutput,
        )?;
        Ok((scope.into_nodes(), outputs))
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.qualified_name())
            .field("interface", &self.interface)
            .finish()
    }
}

impl Entity for Workflow {
    fn name(&self) -> &str {
        &self.name
    }

    fn module(&self) -> &str {
        &self.module
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Workflow
    }

    fn interface(&self) -> &TypedInterface {
        &self.interface
    }

    fn execute_local(&self, ctx: &FlowContext, inputs: &LiteralMap) -> FlowResult<LiteralMap> {
        self.interface.validate_inputs(inputs)?;
        debug!(workflow = %self.qualified_name(), "running workflow locally");

        let state = ctx
            .execution_state()
            .with_mode(ExecutionMode::LocalWorkflowExecution);
        let local_ctx = ctx.with_execution_state(state);

        let mut scope = NodeScope::local(&local_ctx);
        let outputs = (self.function)(&mut scope, &Bindings::from(inputs))?.to_literal_map()?;
        self.interface.validate_outputs(&outputs)?;
        Ok(outputs)
    }

    fn dispatch_execute(
        &self,
        ctx: &FlowContext,
        inputs: &LiteralMap,
    ) -> FlowResult<DispatchOutput> {
        if ctx.execution_state().is_local_execution() {
            return self.execute_local(ctx, inputs).map(DispatchOutput::Literals);
        }
        Err(FlowError::NotDispatchable(self.qualified_name()))
    }

    fn compile_into(
        &self,
        ctx: &FlowContext,
        collector: &mut EntityCollector,
    ) -> FlowResult<NodeTarget> {
        let settings = ctx
            .serialization_settings()
            .ok_or_else(|| FlowError::MissingSerializationSettings(self.qualified_name()))?;
        let id = Identifier::new(ResourceType::Workflow, settings, self.qualified_name());

        if !collector.contains_workflow(&id) {
            let spec = self.compile_spec(ctx, collector)?;
            collector.add_workflow(spec);
        }
        Ok(NodeTarget::Workflow(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Image, ImageConfig, SerializationSettings};
    use crate::entities::dynamic::DynamicTask;
    use crate::entities::task::FunctionTask;

    fn t1() -> Arc<FunctionTask> {
        Arc::new(
            FunctionTask::builder("test_workflow", "t1")
                .input("a", LiteralType::integer())
                .output("o0", LiteralType::string())
                .function(|inputs| {
                    let a: i64 = inputs.get_as("a")?;
                    Ok(LiteralMap::new().with("o0", format!("fast-{}", a + 2)))
                }),
        )
    }

    fn my_wf() -> Workflow {
        let child = t1();
        let dynamic = Arc::new(
            DynamicTask::builder("test_workflow", "ranged_int_to_str")
                .input("a", LiteralType::integer())
                .output("o0", LiteralType::list_of(LiteralType::string()))
                .dynamic(move |scope, inputs| {
                    let a: i64 = inputs.get_as("a")?;
                    let mut strs = Vec::new();
                    for i in 0..a {
                        let out = scope.call(child.as_ref(), Bindings::new().with("a", i))?;
                        strs.push(out.output("o0")?);
                    }
                    Ok(Bindings::new().with("o0", BindingData::collection(strs)))
                }),
        );

        Workflow::builder("test_workflow", "my_wf")
            .input("a", LiteralType::integer())
            .output("o0", LiteralType::list_of(LiteralType::string()))
            .body(move |scope, inputs| {
                let a = inputs.require("a")?.clone();
                let out = scope.call(dynamic.as_ref(), Bindings::new().with("a", a))?;
                Ok(Bindings::new().with("o0", out.output("o0")?))
            })
    }

    fn ctx() -> FlowContext {
        FlowContext::new().with_serialization_settings(SerializationSettings::new(
            "p",
            "d",
            "v",
            ImageConfig::new(Image::new("default", "app", "v1")),
        ))
    }

    #[test]
    fn test_local_execution() {
        let wf = my_wf();
        let outputs = wf
            .execute_local(&FlowContext::new(), &LiteralMap::new().with("a", 5i64))
            .unwrap();

        assert_eq!(
            outputs.get_as::<Vec<String>>("o0").unwrap(),
            vec!["fast-2", "fast-3", "fast-4", "fast-5", "fast-6"]
        );
    }

    #[test]
    fn test_compile_closure() {
        let closure = my_wf().compile(&ctx()).unwrap();

        assert_eq!(closure.workflow.id.name, "test_workflow.my_wf");
        assert_eq!(closure.workflow.nodes.len(), 1);
        assert_eq!(closure.workflow.nodes[0].id, "n0");
        // Inputs come from the start node, which is not an upstream dependency
        assert!(closure.workflow.nodes[0].upstream_node_ids.is_empty());
        assert_eq!(
            closure.workflow.nodes[0].inputs[0].binding.promises()[0].node_id,
            START_NODE_ID
        );
        // Only the dynamic task itself is known at compile time
        assert_eq!(closure.tasks.len(), 1);
        assert_eq!(closure.tasks[0].id.name, "test_workflow.ranged_int_to_str");
        assert!(closure.subworkflows.is_empty());

        assert_eq!(closure.workflow.outputs.len(), 1);
        assert_eq!(closure.workflow.outputs[0].binding.promises()[0].to_string(), "n0.o0");
    }

    #[test]
    fn test_dispatch_outside_local_mode_fails() {
        let wf = my_wf();
        let state = ctx().execution_state().with_mode(ExecutionMode::TaskExecution);
        let err = wf
            .dispatch_execute(
                &ctx().with_execution_state(state),
                &LiteralMap::new().with("a", 1i64),
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::NotDispatchable(_)));
    }

    #[test]
    fn test_nested_workflow_compiled_once() {
        let child = t1();
        let inner = Arc::new(
            Workflow::builder("test_workflow", "inner")
                .input("a", LiteralType::integer())
                .output("o0", LiteralType::string())
                .body(move |scope, inputs| {
                    let a = inputs.require("a")?.clone();
                    let out = scope.call(child.as_ref(), Bindings::new().with("a", a))?;
                    Ok(Bindings::new().with("o0", out.output("o0")?))
                }),
        );

        let outer = Workflow::builder("test_workflow", "outer")
            .input("a", LiteralType::integer())
            .output("o0", LiteralType::string())
            .body(move |scope, inputs| {
                let a = inputs.require("a")?.clone();
                scope.call(inner.as_ref(), Bindings::new().with("a", a))?;
                let second = scope.call(inner.as_ref(), Bindings::new().with("a", 1i64))?;
                Ok(Bindings::new().with("o0", second.output("o0")?))
            });

        let closure = outer.compile(&ctx()).unwrap();
        assert_eq!(closure.workflow.nodes.len(), 2);
        assert_eq!(closure.subworkflows.len(), 1);
        assert_eq!(closure.tasks.len(), 1);
    }

    #[test]
    fn test_missing_output_binding() {
        let wf = Workflow::builder("test_workflow", "empty")
            .output("o0", LiteralType::integer())
            .body(|_, _| Ok(Bindings::new()));

        let err = wf.compile(&ctx()).unwrap_err();
        assert!(matches!(err, FlowError::MissingOutput(name) if name == "o0"));
    }
}
