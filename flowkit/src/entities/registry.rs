// Entity Registry
// Explicit lookup of registered entities, used to resolve loader args

use crate::entities::entity::Entity;
use crate::error::{FlowError, FlowResult};

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Entities keyed by `module.name`, in registration order
#[derive(Default, Clone)]
pub struct EntityRegistry {
    entities: IndexMap<String, Arc<dyn Entity>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity; names must be unique
    pub fn register(&mut self, entity: Arc<dyn Entity>) -> FlowResult<()> {
        let key = entity.qualified_name();
        if self.entities.contains_key(&key) {
            return Err(FlowError::DuplicateEntity(key));
        }
        self.entities.insert(key, entity);
        Ok(())
    }

    /// Look up by qualified name, or by bare name when it is unambiguous
    pub fn get(&self, name: &str) -> FlowResult<Arc<dyn Entity>> {
        if let Some(entity) = self.entities.get(name) {
            return Ok(entity.clone());
        }

        let mut matches = self.entities.values().filter(|e| e.name() == name);
        match (matches.next(), matches.next()) {
            (Some(entity), None) => Ok(entity.clone()),
            _ => Err(FlowError::EntityNotFound(name.to_string())),
        }
    }

    pub fn find(&self, module: &str, name: &str) -> FlowResult<Arc<dyn Entity>> {
        self.entities
            .get(&format!("{}.{}", module, name))
            .cloned()
            .ok_or_else(|| FlowError::EntityNotFound(format!("{}.{}", module, name)))
    }

    /// Resolve `task-module <module> task-name <name>`
    pub fn resolve(&self, loader_args: &[String]) -> FlowResult<Arc<dyn Entity>> {
        match loader_args {
            [module_flag, module, name_flag, name]
                if module_flag == "task-module" && name_flag == "task-name" =>
            {
                self.find(module, name)
            }
            _ => Err(FlowError::InvalidLoaderArgs(loader_args.join(" "))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Entity>> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entities.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::loader_args;
    use crate::entities::entity::EntityKind;
    use crate::entities::task::FunctionTask;
    use crate::types::LiteralMap;

    fn task(module: &str, name: &str) -> Arc<dyn Entity> {
        Arc::new(FunctionTask::builder(module, name).function(|_| Ok(LiteralMap::new())))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = EntityRegistry::new();
        registry.register(task("demo", "t1")).unwrap();
        registry.register(task("demo", "t2")).unwrap();

        let entity = registry.resolve(&loader_args("demo", "t2")).unwrap();
        assert_eq!(entity.qualified_name(), "demo.t2");
        assert_eq!(entity.kind(), EntityKind::Task);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = EntityRegistry::new();
        registry.register(task("demo", "t1")).unwrap();
        let err = registry.register(task("demo", "t1")).unwrap_err();
        assert!(matches!(err, FlowError::DuplicateEntity(name) if name == "demo.t1"));
    }

    #[test]
    fn test_get_by_short_name() {
        let mut registry = EntityRegistry::new();
        registry.register(task("a", "t1")).unwrap();
        registry.register(task("a", "t2")).unwrap();
        registry.register(task("b", "t2")).unwrap();

        assert_eq!(registry.get("t1").unwrap().qualified_name(), "a.t1");
        assert_eq!(registry.get("b.t2").unwrap().qualified_name(), "b.t2");
        // Ambiguous short name
        assert!(registry.get("t2").is_err());
    }

    #[test]
    fn test_bad_loader_args() {
        let registry = EntityRegistry::new();
        let args = vec!["task-name".to_string(), "t1".to_string()];
        assert!(matches!(
            registry.resolve(&args),
            Err(FlowError::InvalidLoaderArgs(_))
        ));
        assert!(matches!(
            registry.resolve(&loader_args("demo", "missing")),
            Err(FlowError::EntityNotFound(_))
        ));
    }
}
