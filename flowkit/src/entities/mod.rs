// Entities Module
// Tasks, dynamic tasks and workflows behind a shared callable-node interface

pub mod binding;
pub mod dynamic;
pub mod entity;
pub mod registry;
pub mod scope;
pub mod task;
pub mod workflow;

// Re-export key types
pub use binding::{Bindings, IntoBinding, NodeOutputs};
pub use dynamic::{DynamicFunction, DynamicTask};
pub use entity::{DispatchOutput, Entity, EntityCollector, EntityKind};
pub use registry::EntityRegistry;
pub use scope::{NodeScope, DYNAMIC_NODE_PREFIX, WORKFLOW_NODE_PREFIX};
pub use task::{FunctionTask, TaskBuilder, TaskFunction};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowFunction};
