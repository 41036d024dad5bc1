// Demo Entities
// The fan-out example: a task, a dynamic task looping over it, and a workflow

use std::sync::Arc;

use flowkit::models::BindingData;
use flowkit::{
    Bindings, DynamicTask, EntityRegistry, FlowResult, FunctionTask, LiteralMap, LiteralType,
    Workflow,
};

pub const DEMO_MODULE: &str = "demos";

/// Task that formats `a + 2`
pub fn add_two() -> FunctionTask {
    FunctionTask::builder(DEMO_MODULE, "add_two")
        .input("a", LiteralType::integer())
        .output("o0", LiteralType::string())
        .function(|inputs| {
            let a: i64 = inputs.get_as("a")?;
            Ok(LiteralMap::new().with("o0", format!("fast-{}", a + 2)))
        })
}

/// Dynamic task calling `child` once per value in `0..a`
pub fn fan_out(child: Arc<FunctionTask>) -> DynamicTask {
    DynamicTask::builder(DEMO_MODULE, "fan_out")
        .input("a", LiteralType::integer())
        .output("o0", LiteralType::list_of(LiteralType::string()))
        .dynamic(move |scope, inputs| {
            let a: i64 = inputs.get_as("a")?;
            let mut results = Vec::new();
            for i in 0..a {
                let out = scope.call(child.as_ref(), Bindings::new().with("a", i))?;
                results.push(out.output("o0")?);
            }
            Ok(Bindings::new().with("o0", BindingData::collection(results)))
        })
}

/// Workflow wrapping the fan-out
pub fn fan_out_wf(dynamic: Arc<DynamicTask>) -> Workflow {
    Workflow::builder(DEMO_MODULE, "fan_out_wf")
        .input("a", LiteralType::integer())
        .output("o0", LiteralType::list_of(LiteralType::string()))
        .body(move |scope, inputs| {
            let a = inputs.require("a")?.clone();
            let out = scope.call(dynamic.as_ref(), Bindings::new().with("a", a))?;
            Ok(Bindings::new().with("o0", out.output("o0")?))
        })
}

/// Registry holding every demo entity
pub fn registry() -> FlowResult<EntityRegistry> {
    let task = Arc::new(add_two());
    let dynamic = Arc::new(fan_out(task.clone()));
    let workflow = Arc::new(fan_out_wf(dynamic.clone()));

    let mut registry = EntityRegistry::new();
    registry.register(task)?;
    registry.register(dynamic)?;
    registry.register(workflow)?;
    Ok(registry)
}
