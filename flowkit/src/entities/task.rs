// Function Tasks
// Tasks backed by a native function, plus the template every task serializes to

use crate::container::{build_container, execute_args, loader_args, DEFAULT_RESOLVER};
use crate::context::{FlowContext, SerializationSettings};
use crate::entities::entity::{DispatchOutput, Entity, EntityCollector, EntityKind};
use crate::error::{FlowError, FlowResult};
use crate::models::{Identifier, NodeTarget, ResourceType, TaskMetadata, TaskTemplate, PYTHON_TASK_TYPE};
use crate::types::{LiteralMap, LiteralType, TypedInterface};

use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Body of a function task
pub type TaskFunction = Arc<dyn Fn(&LiteralMap) -> FlowResult<LiteralMap> + Send + Sync>;

/// Naming, metadata and resolver shared by every task flavor
#[derive(Debug, Clone)]
pub(crate) struct TaskHeader {
    pub module: String,
    pub name: String,
    pub interface: TypedInterface,
    pub metadata: TaskMetadata,
    pub resolver: String,
}

impl TaskHeader {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            interface: TypedInterface::new(),
            metadata: TaskMetadata::default(),
            resolver: DEFAULT_RESOLVER.to_string(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Serialize into a task template under the given settings
    pub fn to_template(&self, settings: &SerializationSettings) -> TaskTemplate {
        let args = execute_args(&self.resolver, &loader_args(&self.module, &self.name));
        TaskTemplate {
            id: Identifier::new(ResourceType::Task, settings, self.qualified_name()),
            task_type: PYTHON_TASK_TYPE.to_string(),
            metadata: self.metadata.clone(),
            interface: self.interface.clone(),
            container: Some(build_container(settings, args)),
        }
    }

    /// Add the template to a collector unless it is already there
    pub fn compile_into(
        &self,
        ctx: &FlowContext,
        collector: &mut EntityCollector,
    ) -> FlowResult<NodeTarget> {
        let settings = ctx
            .serialization_settings()
            .ok_or_else(|| FlowError::MissingSerializationSettings(self.qualified_name()))?;
        let template = self.to_template(settings);
        let id = template.id.clone();
        collector.add_task(template);
        Ok(NodeTarget::Task(id))
    }
}

/// Builder for tasks; finished by supplying the body
pub struct TaskBuilder {
    header: TaskHeader,
}

impl TaskBuilder {
    pub(crate) fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            header: TaskHeader::new(module, name),
        }
    }

    pub fn input(mut self, name: impl Into<String>, literal_type: LiteralType) -> Self {
        self.header.interface.inputs.insert(name.into(), literal_type);
        self
    }

    pub fn output(mut self, name: impl Into<String>, literal_type: LiteralType) -> Self {
        self.header.interface.outputs.insert(name.into(), literal_type);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.header.metadata.retries = retries;
        self
    }

    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.header.metadata.timeout_seconds = Some(seconds);
        self
    }

    /// Allow cached outputs, keyed by the given version
    pub fn cache(mut self, version: impl Into<String>) -> Self {
        self.header.metadata.cache = true;
        self.header.metadata.cache_version = version.into();
        self
    }

    /// Resolver written into the container args
    pub fn resolver(mut self, resolver: impl Into<String>) -> Self {
        self.header.resolver = resolver.into();
        self
    }

    pub(crate) fn into_header(self) -> TaskHeader {
        self.header
    }

    /// Finish as a function task
    pub fn function<F>(self, function: F) -> FunctionTask
    where
        F: Fn(&LiteralMap) -> FlowResult<LiteralMap> + Send + Sync + 'static,
    {
        FunctionTask {
            header: self.header,
            function: Arc::new(function),
        }
    }
}

/// A task that runs a native function over literal maps
#[derive(Clone)]
pub struct FunctionTask {
    header: TaskHeader,
    function: TaskFunction,
}

impl FunctionTask {
    pub fn builder(module: impl Into<String>, name: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(module, name)
    }

    pub fn metadata(&self) -> &TaskMetadata {
        &self.header.metadata
    }

    pub fn resolver(&self) -> &str {
        &self.header.resolver
    }

    /// Serialize into a registrable template
    pub fn to_template(&self, settings: &SerializationSettings) -> TaskTemplate {
        self.header.to_template(settings)
    }
}

impl fmt::Debug for FunctionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTask")
            .field("name", &self.header.qualified_name())
            .field("interface", &self.header.interface)
            .field("metadata", &self.header.metadata)
            .finish()
    }
}

impl Entity for FunctionTask {
    fn name(&self) -> &str {
        &self.header.name
    }

    fn module(&self) -> &str {
        &self.header.module
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Task
    }

    fn interface(&self) -> &TypedInterface {
        &self.header.interface
    }

    fn retries(&self) -> u32 {
        self.header.metadata.retries
    }

    fn execute_local(&self, _ctx: &FlowContext, inputs: &LiteralMap) -> FlowResult<LiteralMap> {
        self.header.interface.validate_inputs(inputs)?;
        debug!(task = %self.header.qualified_name(), "running task function");
        let outputs = (self.function)(inputs)?;
        self.header.interface.validate_outputs(&outputs)?;
        Ok(outputs)
    }

    fn dispatch_execute(
        &self,
        ctx: &FlowContext,
        inputs: &LiteralMap,
    ) -> FlowResult<DispatchOutput> {
        self.execute_local(ctx, inputs).map(DispatchOutput::Literals)
    }

    fn compile_into(
        &self,
        ctx: &FlowContext,
        collector: &mut EntityCollector,
    ) -> FlowResult<NodeTarget> {
        self.header.compile_into(ctx, collector)
    }
}
