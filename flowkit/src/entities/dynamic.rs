// Dynamic Tasks
// Tasks whose body expands into a subgraph of child calls at execution time

use crate::container::{fast_execute_args, unwrap_fast_execute};
use crate::context::{
    ExecutionMode, FlowContext, SerializationSettings, DYNAMIC_ADDL_DISTRO, DYNAMIC_DEST_DIR,
};
use crate::entities::binding::Bindings;
use crate::entities::entity::{DispatchOutput, Entity, EntityCollector, EntityKind};
use crate::entities::scope::{NodeScope, DYNAMIC_NODE_PREFIX};
use crate::entities::task::{TaskBuilder, TaskHeader};
use crate::error::{FlowError, FlowResult};
use crate::models::{DynamicJobSpec, NodeTarget, TaskMetadata, TaskTemplate};
use crate::types::{LiteralMap, TypedInterface};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Body of a dynamic task. Child calls go through the scope; the returned
/// bindings become the task's outputs.
pub type DynamicFunction =
    Arc<dyn Fn(&mut NodeScope<'_>, &LiteralMap) -> FlowResult<Bindings> + Send + Sync>;

impl TaskBuilder {
    /// Finish as a dynamic task
    pub fn dynamic<F>(self, function: F) -> DynamicTask
    where
        F: Fn(&mut NodeScope<'_>, &LiteralMap) -> FlowResult<Bindings> + Send + Sync + 'static,
    {
        DynamicTask {
            header: self.into_header(),
            function: Arc::new(function),
        }
    }
}

/// A task that runs its body at execution time to decide what to run.
///
/// Run locally, child calls execute immediately. Under task execution the
/// body is traced into a [`DynamicJobSpec`].
#[derive(Clone)]
pub struct DynamicTask {
    header: TaskHeader,
    function: DynamicFunction,
}

impl DynamicTask {
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(module, name)
    }

    pub fn metadata(&self) -> &TaskMetadata {
        &self.header.metadata
    }

    /// Serialize into a registrable template
    pub fn to_template(&self, settings: &SerializationSettings) -> TaskTemplate {
        self.header.to_template(settings)
    }

    /// Trace the body into a job spec under the given context
    pub fn compile_job_spec(
        &self,
        ctx: &FlowContext,
        inputs: &LiteralMap,
    ) -> FlowResult<DynamicJobSpec> {
        let name = self.header.qualified_name();
        let settings = ctx
            .serialization_settings()
            .ok_or_else(|| FlowError::MissingSerializationSettings(name.clone()))?;
        self.header.interface.validate_inputs(inputs)?;

        // Resolve the archive location up front so a bad context fails before tracing
        let fast_location = if settings.is_fast() {
            let state = ctx.execution_state();
            let distro = state
                .context_value(DYNAMIC_ADDL_DISTRO)
                .ok_or_else(|| FlowError::MissingAdditionalContext(DYNAMIC_ADDL_DISTRO.to_string()))?;
            let dest_dir = state
                .context_value(DYNAMIC_DEST_DIR)
                .ok_or_else(|| FlowError::MissingAdditionalContext(DYNAMIC_DEST_DIR.to_string()))?;
            Some((distro.to_string(), dest_dir.to_string()))
        } else {
            None
        };

        let mut collector = EntityCollector::new();
        let (nodes, outputs) = {
            let mut scope = NodeScope::compiling(ctx, DYNAMIC_NODE_PREFIX, &mut collector);
            let outputs = (self.function)(&mut scope, inputs)?;
            (scope.into_nodes(), outputs)
        };

        outputs.check_against(
            &self.header.interface.outputs,
            FlowError::MissingOutput,
            FlowError::UnexpectedOutput,
        )?;

        let (mut tasks, subworkflows) = collector.into_parts();
        if let Some((distro, dest_dir)) = &fast_location {
            for task in &mut tasks {
                if let Some(container) = task.container.as_mut() {
                    container.args =
                        fast_execute_args(distro, dest_dir, unwrap_fast_execute(&container.args));
                }
            }
        }

        info!(
            task = %name,
            nodes = nodes.len(),
            tasks = tasks.len(),
            subworkflows = subworkflows.len(),
            "compiled dynamic job spec"
        );

        Ok(DynamicJobSpec {
            min_successes: nodes.len(),
            nodes,
            tasks,
            outputs: outputs.into_bindings(),
            subworkflows,
        })
    }
}

impl fmt::Debug for DynamicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicTask")
            .field("name", &self.header.qualified_name())
            .field("interface", &self.header.interface)
            .field("metadata", &self.header.metadata)
            .finish()
    }
}

impl Entity for DynamicTask {
    fn name(&self) -> &str {
        &self.header.name
    }

    fn module(&self) -> &str {
        &self.header.module
    }

    fn kind(&self) -> EntityKind {
        EntityKind::DynamicTask
    }

    fn interface(&self) -> &TypedInterface {
        &self.header.interface
    }

    fn retries(&self) -> u32 {
        self.header.metadata.retries
    }

    fn execute_local(&self, ctx: &FlowContext, inputs: &LiteralMap) -> FlowResult<LiteralMap> {
        self.header.interface.validate_inputs(inputs)?;
        debug!(task = %self.header.qualified_name(), "running dynamic body locally");

        let mut scope = NodeScope::local(ctx);
        let outputs = (self.function)(&mut scope, inputs)?.to_literal_map()?;
        self.header.interface.validate_outputs(&outputs)?;
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

        debug!(
            task = %self.header.qualified_name(),
            mode = ?ctx.mode().unwrap_or(ExecutionMode::TaskExecution),
            "expanding dynamic task"
        );
        self.compile_job_spec(ctx, inputs).map(DispatchOutput::JobSpec)
    }

    fn compile_into(
        &self,
        ctx: &FlowContext,
        collector: &mut EntityCollector,
    ) -> FlowResult<NodeTarget> {
        self.header.compile_into(ctx, collector)
    }
}
