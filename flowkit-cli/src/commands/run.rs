use crate::output;

use clap::Args;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use serde_json::{Map, Value};

use flowkit::{
    ContextManager, DispatchOutput, Entity, EntityKind, EntityRegistry, ExecutionMode,
    LiteralMap, TypeEngine,
};

/// Run an entity locally
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Entity name, `module.name` or a unique bare name
    pub entity: String,

    /// Set an input (can be repeated, format: name=value, value parsed as JSON when possible)
    #[arg(long = "input", short = 'i', value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,
}

pub fn execute(registry: &EntityRegistry, args: RunArgs) -> Result<()> {
    let entity = registry.get(&args.entity)?;

    output::status("Running", &format!("{} {}", entity.kind(), entity.qualified_name()));
    let outputs = run_local(entity.as_ref(), &parse_inputs(&args.inputs)?)?;

    output::success(&format!("{} completed", entity.qualified_name()));
    println!(
        "{}",
        serde_json::to_string_pretty(&TypeEngine::literal_map_to_json(&outputs))?
    );
    Ok(())
}

/// Turn `name=value` pairs into a JSON object
pub fn parse_inputs(pairs: &[String]) -> Result<Value> {
    let mut object = Map::new();
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("Invalid input format '{}'. Expected name=value", pair);
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        object.insert(name.to_string(), value);
    }
    Ok(Value::Object(object))
}

/// Execute an entity in-process under a local execution context
pub fn run_local(entity: &dyn Entity, inputs: &Value) -> Result<LiteralMap> {
    let literals = TypeEngine::dict_to_literal_map(inputs, Some(entity.interface()))?;

    let mode = match entity.kind() {
        EntityKind::Workflow => ExecutionMode::LocalWorkflowExecution,
        EntityKind::Task | EntityKind::DynamicTask => ExecutionMode::LocalTaskExecution,
    };

    let mut manager = ContextManager::new();
    let state = manager.current().execution_state().with_mode(mode);
    let ctx = manager.current().with_execution_state(state);
    let guard = manager.with_context(ctx);

    let output = entity.dispatch_execute(guard.current(), &literals)?;
    match output {
        DispatchOutput::Literals(outputs) => Ok(outputs),
        DispatchOutput::JobSpec(_) => Err(eyre!(
            "{} expanded into a job spec instead of running locally",
            entity.qualified_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos;

    #[test]
    fn test_parse_inputs() {
        let inputs = parse_inputs(&["a=5".to_string(), "name=demo".to_string()]).unwrap();
        assert_eq!(inputs["a"], Value::from(5));
        assert_eq!(inputs["name"], Value::from("demo"));

        assert!(parse_inputs(&["a".to_string()]).is_err());
    }

    #[test]
    fn test_run_workflow_locally() {
        let registry = demos::registry().unwrap();
        let wf = registry.get("fan_out_wf").unwrap();

        let outputs = run_local(wf.as_ref(), &serde_json::json!({ "a": 3 })).unwrap();
        assert_eq!(
            outputs.get_as::<Vec<String>>("o0").unwrap(),
            vec!["fast-2", "fast-3", "fast-4"]
        );
    }

    #[test]
    fn test_run_rejects_unknown_input() {
        let registry = demos::registry().unwrap();
        let task = registry.get("demos.add_two").unwrap();
        assert!(run_local(task.as_ref(), &serde_json::json!({ "b": 1 })).is_err());
    }
}
