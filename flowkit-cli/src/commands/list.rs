use crate::output;

use clap::Args;
use color_eyre::Result;

use flowkit::{Entity, EntityRegistry, LiteralType, TypedInterface};

/// List registered entities
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show entities of this kind (task, dynamic, workflow)
    #[arg(long, value_name = "KIND")]
    pub kind: Option<String>,
}

pub fn execute(registry: &EntityRegistry, args: ListArgs) -> Result<()> {
    output::header(&format!("{} registered entities", registry.len()));

    for entity in registry.iter() {
        let kind = entity.kind().to_string();
        if args.kind.as_deref().is_some_and(|k| k != kind) {
            continue;
        }
        output::entity_row(&kind, &entity.qualified_name(), &signature(entity.interface()));
    }

    Ok(())
}

/// `(a: integer) -> (o0: string)`
pub fn signature(interface: &TypedInterface) -> String {
    format!(
        "({}) -> ({})",
        render_vars(&interface.inputs),
        render_vars(&interface.outputs)
    )
}

fn render_vars<'a>(vars: impl IntoIterator<Item = (&'a String, &'a LiteralType)>) -> String {
    vars.into_iter()
        .map(|(name, ty)| format!("{}: {}", name, ty))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        let registry = crate::demos::registry().unwrap();
        let entity = registry.get("fan_out").unwrap();
        assert_eq!(
            signature(entity.interface()),
            "(a: integer) -> (o0: list<string>)"
        );
    }
}
