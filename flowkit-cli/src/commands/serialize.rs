use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;
use serde_json::{json, Value};

use flowkit::entities::EntityCollector;
use flowkit::{resolve_settings, Entity, EntityRegistry, FlowContext, SerializationSettings};

/// Print the registrable form of an entity
#[derive(Args, Debug)]
pub struct SerializeArgs {
    /// Entity name, `module.name` or a unique bare name
    pub entity: String,

    /// Serialization settings file (default: $FLOWKIT_CONFIG or ~/.flowkit/config.yaml)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Wrap task commands for fast execution
    #[arg(long)]
    pub fast: bool,
}

pub fn execute(registry: &EntityRegistry, args: SerializeArgs) -> Result<()> {
    let entity = registry.get(&args.entity)?;

    let mut settings = resolve_settings(args.config.as_deref())?;
    if args.fast {
        settings.fast_serialization_settings.enabled = true;
    }

    output::status(
        "Serializing",
        &format!(
            "{} for {}/{}@{}",
            entity.qualified_name(),
            settings.project,
            settings.domain,
            settings.version
        ),
    );
    let document = serialize_entity(entity.as_ref(), settings)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Compile an entity and everything it references into one JSON document
pub fn serialize_entity(entity: &dyn Entity, settings: SerializationSettings) -> Result<Value> {
    let ctx = FlowContext::new().with_serialization_settings(settings);
    let mut collector = EntityCollector::new();
    let target = entity.compile_into(&ctx, &mut collector)?;
    let (tasks, workflows) = collector.into_parts();

    output::info(&format!(
        "{} task(s), {} workflow(s)",
        tasks.len(),
        workflows.len()
    ));

    Ok(json!({
        "target": target,
        "tasks": tasks,
        "workflows": workflows,
    }))
}
