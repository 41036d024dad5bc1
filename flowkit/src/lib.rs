// Flowkit Library
// Typed tasks and workflows with dynamic expansion into job specs

pub mod config;
pub mod container;
pub mod context;
pub mod entities;
pub mod error;
pub mod models;
pub mod types;

// Re-export commonly used types
pub use error::{FlowError, FlowResult};

// Re-export config types
pub use config::{load_settings, resolve_settings, ConfigError, ConfigErrorKind};

// Re-export context types
pub use context::{
    ContextGuard, ContextManager, ExecutionMode, ExecutionState, FastSerializationSettings,
    FlowContext, Image, ImageConfig, SerializationSettings, DYNAMIC_ADDL_DISTRO,
    DYNAMIC_DEST_DIR,
};

// Re-export entity types
pub use entities::{
    Bindings, DispatchOutput, DynamicTask, Entity, EntityKind, EntityRegistry, FunctionTask,
    NodeOutputs, NodeScope, Workflow,
};

// Re-export model types
pub use models::{
    Binding, BindingData, Container, DynamicJobSpec, Identifier, Node, NodeTarget,
    OutputReference, TaskTemplate, WorkflowClosure, WorkflowSpec,
};

// Re-export type system
pub use types::{Literal, LiteralMap, LiteralType, TypeEngine, TypeTransformer, TypedInterface};
