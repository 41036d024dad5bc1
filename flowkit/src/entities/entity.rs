// Entity Interface
// The callable-node contract shared by tasks, dynamic tasks and workflows

use crate::context::FlowContext;
use crate::error::FlowResult;
use crate::models::{DynamicJobSpec, Identifier, NodeTarget, TaskTemplate, WorkflowSpec};
use crate::types::{LiteralMap, TypedInterface};

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    DynamicTask,
    Workflow,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Task => "task",
            EntityKind::DynamicTask => "dynamic",
            EntityKind::Workflow => "workflow",
        };
        f.write_str(name)
    }
}

/// Result of dispatching an entity
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutput {
    /// The entity ran and produced its outputs
    Literals(LiteralMap),
    /// The entity expanded into a subgraph that still has to run
    JobSpec(DynamicJobSpec),
}

impl DispatchOutput {
    pub fn into_literals(self) -> Option<LiteralMap> {
        match self {
            DispatchOutput::Literals(literals) => Some(literals),
            DispatchOutput::JobSpec(_) => None,
        }
    }

    pub fn into_job_spec(self) -> Option<DynamicJobSpec> {
        match self {
            DispatchOutput::JobSpec(spec) => Some(spec),
            DispatchOutput::Literals(_) => None,
        }
    }
}

/// Something that can be called from a workflow or dynamic task body
pub trait Entity: Send + Sync {
    fn name(&self) -> &str;

    fn module(&self) -> &str;

    /// `module.name`, the registered name of the entity
    fn qualified_name(&self) -> String {
        format!("{}.{}", self.module(), self.name())
    }

    fn kind(&self) -> EntityKind;

    fn interface(&self) -> &TypedInterface;

    /// Retries recorded on nodes that call this entity
    fn retries(&self) -> u32 {
        0
    }

    /// Run the entity in-process with resolved inputs
    fn execute_local(&self, ctx: &FlowContext, inputs: &LiteralMap) -> FlowResult<LiteralMap>;

    /// Run the entity the way a task container would, honoring the context's execution mode
    fn dispatch_execute(&self, ctx: &FlowContext, inputs: &LiteralMap)
        -> FlowResult<DispatchOutput>;

    /// Add the entity's compiled form to a collector and return what a node should target
    fn compile_into(
        &self,
        ctx: &FlowContext,
        collector: &mut EntityCollector,
    ) -> FlowResult<NodeTarget>;
}

/// Task templates and workflow specs referenced while compiling, deduplicated by id
#[derive(Debug, Default)]
pub struct EntityCollector {
    tasks: IndexMap<Identifier, TaskTemplate>,
    workflows: IndexMap<Identifier, WorkflowSpec>,
}

impl EntityCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task template; returns false if one with the same id is already present
    pub fn add_task(&mut self, template: TaskTemplate) -> bool {
        if self.tasks.contains_key(&template.id) {
            return false;
        }
        self.tasks.insert(template.id.clone(), template);
        true
    }

    pub fn contains_task(&self, id: &Identifier) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn add_workflow(&mut self, spec: WorkflowSpec) -> bool {
        if self.workflows.contains_key(&spec.id) {
            return false;
        }
        self.workflows.insert(spec.id.clone(), spec);
        true
    }

    pub fn contains_workflow(&self, id: &Identifier) -> bool {
        self.workflows.contains_key(id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks and workflows in first-seen order
    pub fn into_parts(self) -> (Vec<TaskTemplate>, Vec<WorkflowSpec>) {
        (
            self.tasks.into_values().collect(),
            self.workflows.into_values().collect(),
        )
    }
}
