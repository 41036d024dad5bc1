use crate::output;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde_json::Value;
use tracing::info;

use flowkit::{
    resolve_settings, ContextManager, DispatchOutput, Entity, EntityRegistry, ExecutionMode,
    TypeEngine, DYNAMIC_ADDL_DISTRO, DYNAMIC_DEST_DIR,
};

/// File written when the entity ran to completion
pub const OUTPUTS_FILE: &str = "outputs.json";

/// File written when the entity expanded into a dynamic job spec
pub const FUTURES_FILE: &str = "futures.json";

/// Dispatch an entity the way a task container does
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// JSON file holding the input values
    #[arg(long, value_name = "FILE")]
    pub inputs: PathBuf,

    /// Directory the outputs or job spec are written to
    #[arg(long, value_name = "DIR")]
    pub output_prefix: PathBuf,

    /// Serialization settings file (default: $FLOWKIT_CONFIG or ~/.flowkit/config.yaml)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Code archive children of a dynamic task fetch at startup
    #[arg(long, value_name = "URI")]
    pub dynamic_addl_distro: Option<String>,

    /// Directory children of a dynamic task unpack the archive into
    #[arg(long, value_name = "DIR")]
    pub dynamic_dest_dir: Option<String>,

    /// Loader args: task-module <module> task-name <name>
    #[arg(last = true, required = true, value_name = "LOADER_ARGS")]
    pub loader_args: Vec<String>,
}

pub fn execute(registry: &EntityRegistry, args: ExecuteArgs) -> Result<()> {
    let written = dispatch(registry, &args)?;
    output::success(&format!("wrote {}", written.display()));
    Ok(())
}

/// Resolve, dispatch and write the result; returns the file written
pub fn dispatch(registry: &EntityRegistry, args: &ExecuteArgs) -> Result<PathBuf> {
    let settings = resolve_settings(args.config.as_deref())?;
    let entity = registry.resolve(&args.loader_args)?;
    output::status("Executing", &entity.qualified_name());

    let raw = fs::read_to_string(&args.inputs)
        .wrap_err_with(|| format!("failed to read inputs from {}", args.inputs.display()))?;
    let values: Value = serde_json::from_str(&raw)?;
    let inputs = TypeEngine::dict_to_literal_map(&values, Some(entity.interface()))?;

    let mut additional_context = BTreeMap::new();
    if let Some(distro) = &args.dynamic_addl_distro {
        additional_context.insert(DYNAMIC_ADDL_DISTRO.to_string(), distro.clone());
    }
    if let Some(dest_dir) = &args.dynamic_dest_dir {
        additional_context.insert(DYNAMIC_DEST_DIR.to_string(), dest_dir.clone());
    }

    let mut manager = ContextManager::new();
    let ctx = manager.current().with_serialization_settings(settings);
    let mut outer = manager.with_context(ctx);
    let state = outer
        .current()
        .execution_state()
        .with_params(ExecutionMode::TaskExecution, additional_context);
    let ctx = outer.current().with_execution_state(state);
    let inner = outer.with_context(ctx);

    let result = entity.dispatch_execute(inner.current(), &inputs)?;
    write_output(&args.output_prefix, result)
}

fn write_output(prefix: &Path, result: DispatchOutput) -> Result<PathBuf> {
    fs::create_dir_all(prefix)
        .wrap_err_with(|| format!("failed to create {}", prefix.display()))?;

    let (path, body) = match result {
        DispatchOutput::Literals(outputs) => {
            output::info(&format!("{} output(s)", outputs.len()));
            (
                prefix.join(OUTPUTS_FILE),
                serde_json::to_string_pretty(&TypeEngine::literal_map_to_json(&outputs))?,
            )
        }
        DispatchOutput::JobSpec(spec) => {
            output::info(&format!(
                "dynamic job spec: {} node(s), {} task(s)",
                spec.nodes.len(),
                spec.tasks.len()
            ));
            (prefix.join(FUTURES_FILE), serde_json::to_string_pretty(&spec)?)
        }
    };

    fs::write(&path, body).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote execution result");
    Ok(path)
}
