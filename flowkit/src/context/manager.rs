// Context Manager
// A stack of execution contexts with scoped, guard-based activation

use crate::context::settings::SerializationSettings;
use crate::context::state::{ExecutionMode, ExecutionState};

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

/// Serialization settings and execution state visible to a running entity
#[derive(Debug, Clone, Default)]
pub struct FlowContext {
    serialization_settings: Option<Arc<SerializationSettings>>,
    execution_state: ExecutionState,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialization_settings(&self) -> Option<&SerializationSettings> {
        self.serialization_settings.as_deref()
    }

    pub fn execution_state(&self) -> &ExecutionState {
        &self.execution_state
    }

    pub fn mode(&self) -> Option<ExecutionMode> {
        self.execution_state.mode()
    }

    /// Derive a context carrying new serialization settings
    pub fn with_serialization_settings(&self, settings: SerializationSettings) -> Self {
        Self {
            serialization_settings: Some(Arc::new(settings)),
            execution_state: self.execution_state.clone(),
        }
    }

    /// Derive a context carrying a new execution state
    pub fn with_execution_state(&self, state: ExecutionState) -> Self {
        Self {
            serialization_settings: self.serialization_settings.clone(),
            execution_state: state,
        }
    }
}

/// Stack of contexts; the root context is never popped
#[derive(Debug, Default)]
pub struct ContextManager {
    root: FlowContext,
    pushed: Vec<FlowContext>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: FlowContext) -> Self {
        Self {
            root,
            pushed: Vec::new(),
        }
    }

    /// The innermost active context
    pub fn current(&self) -> &FlowContext {
        self.pushed.last().unwrap_or(&self.root)
    }

    /// Number of contexts on the stack, including the root
    pub fn size(&self) -> usize {
        self.pushed.len() + 1
    }

    /// Activate a context until the returned guard is dropped
    pub fn with_context(&mut self, ctx: FlowContext) -> ContextGuard<'_> {
        self.pushed.push(ctx);
        trace!(depth = self.size(), "context pushed");
        ContextGuard { manager: self }
    }

    /// Run a closure with a context active, popping it afterwards even on panic
    pub fn scoped<R>(&mut self, ctx: FlowContext, f: impl FnOnce(&mut ContextManager) -> R) -> R {
        let mut guard = self.with_context(ctx);
        f(&mut guard)
    }

    fn pop(&mut self) {
        self.pushed.pop();
        trace!(depth = self.size(), "context popped");
    }
}

/// Keeps a context active; dropping it restores the previous context
#[must_use = "the context is popped as soon as the guard is dropped"]
pub struct ContextGuard<'a> {
    manager: &'a mut ContextManager,
}

impl Deref for ContextGuard<'_> {
    type Target = ContextManager;

    fn deref(&self) -> &ContextManager {
        &*self.manager
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut ContextManager {
        &mut *self.manager
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.manager.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::settings::{Image, ImageConfig};
    use crate::error::{FlowError, FlowResult};
    use std::collections::BTreeMap;
    use std::panic::{self, AssertUnwindSafe};

    fn settings() -> SerializationSettings {
        SerializationSettings::new(
            "test_proj",
            "test_domain",
            "abc",
            ImageConfig::new(Image::new("name", "image", "name")),
        )
    }

    #[test]
    fn test_nested_scopes_restore_size() {
        let mut manager = ContextManager::new();
        assert_eq!(manager.size(), 1);

        {
            let ctx = manager.current().with_serialization_settings(settings());
            let mut outer = manager.with_context(ctx);
            assert_eq!(outer.size(), 2);

            let state = outer
                .current()
                .execution_state()
                .with_params(ExecutionMode::TaskExecution, BTreeMap::new());
            let ctx = outer.current().with_execution_state(state);
            let inner = outer.with_context(ctx);

            assert_eq!(inner.size(), 3);
            assert_eq!(inner.current().mode(), Some(ExecutionMode::TaskExecution));
            // Settings flow through derived contexts
            assert_eq!(
                inner.current().serialization_settings().map(|s| s.version.as_str()),
                Some("abc")
            );
        }

        assert_eq!(manager.size(), 1);
        assert!(manager.current().serialization_settings().is_none());
    }

    #[test]
    fn test_scoped_pops_on_error() {
        let mut manager = ContextManager::new();
        let result: FlowResult<()> = manager.scoped(FlowContext::new(), |mgr| {
            assert_eq!(mgr.size(), 2);
            Err(FlowError::EntityNotFound("t1".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(manager.size(), 1);
    }

    #[test]
    fn test_scoped_pops_on_panic() {
        let mut manager = ContextManager::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            manager.scoped(FlowContext::new(), |mgr| {
                let _inner = mgr.with_context(FlowContext::new());
                panic!("task body failed");
            })
        }));

        assert!(result.is_err());
        assert_eq!(manager.size(), 1);
    }

    #[test]
    fn test_custom_root() {
        let root = FlowContext::new().with_serialization_settings(settings());
        let manager = ContextManager::with_root(root);
        assert_eq!(manager.size(), 1);
        assert!(manager.current().serialization_settings().is_some());
    }
}
