// Execution State
// The mode an entity runs in plus extra key/value context handed down by the platform

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Additional context key holding the code archive a dynamic task's children fetch
pub const DYNAMIC_ADDL_DISTRO: &str = "dynamic_addl_distro";

/// Additional context key holding the directory the archive is unpacked into
pub const DYNAMIC_DEST_DIR: &str = "dynamic_dest_dir";

/// How entities behave when dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Running inside a container on the platform; dynamic tasks compile into job specs
    TaskExecution,
    /// A whole workflow is run in-process
    LocalWorkflowExecution,
    /// A single task is run in-process
    LocalTaskExecution,
}

impl ExecutionMode {
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ExecutionMode::LocalWorkflowExecution | ExecutionMode::LocalTaskExecution
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionState {
    mode: Option<ExecutionMode>,
    additional_context: BTreeMap<String, String>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<ExecutionMode> {
        self.mode
    }

    pub fn additional_context(&self) -> &BTreeMap<String, String> {
        &self.additional_context
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.additional_context.get(key).map(String::as_str)
    }

    /// Derive a new state with the given mode and additional context
    pub fn with_params(
        &self,
        mode: ExecutionMode,
        additional_context: BTreeMap<String, String>,
    ) -> Self {
        Self {
            mode: Some(mode),
            additional_context,
        }
    }

    /// Derive a new state with only the mode changed
    pub fn with_mode(&self, mode: ExecutionMode) -> Self {
        Self {
            mode: Some(mode),
            additional_context: self.additional_context.clone(),
        }
    }

    pub fn is_local_execution(&self) -> bool {
        self.mode.map(|m| m.is_local()).unwrap_or(false)
    }
}
