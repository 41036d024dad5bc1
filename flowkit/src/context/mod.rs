// Execution Context Module
// Serialization settings, execution state and the scoped context stack

pub mod manager;
pub mod settings;
pub mod state;

// Re-export key types
pub use manager::{ContextGuard, ContextManager, FlowContext};
pub use settings::{FastSerializationSettings, Image, ImageConfig, SerializationSettings};
pub use state::{ExecutionMode, ExecutionState, DYNAMIC_ADDL_DISTRO, DYNAMIC_DEST_DIR};
