// Compiled Entity Models
// Task templates, nodes, bindings and the specs produced by compilation

use crate::context::SerializationSettings;
use crate::error::{FlowError, FlowResult};
use crate::types::{Literal, LiteralType, TypedInterface};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Node id that stands for a workflow's own inputs
pub const START_NODE_ID: &str = "start-node";

/// Task type written into every function task template
pub const PYTHON_TASK_TYPE: &str = "python-task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Task,
    Workflow,
}

/// Fully qualified, versioned name of a registered entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub resource_type: ResourceType,
    pub project: String,
    pub domain: String,
    pub name: String,
    pub version: String,
}

impl Identifier {
    /// Identifier in the project, domain and version of the given settings
    pub fn new(
        resource_type: ResourceType,
        settings: &SerializationSettings,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            project: settings.project.clone(),
            domain: settings.domain.clone(),
            name: name.into(),
            version: settings.version.clone(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.project, self.domain, self.name, self.version
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Whether outputs may be served from the cache
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub cache_version: String,
}

/// Container a task runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub image: String,
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Container {
    /// Arguments joined into a single command line
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Registrable form of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: Identifier,
    #[serde(rename = "type")]
    pub task_type: String,
    pub metadata: TaskMetadata,
    pub interface: TypedInterface,
    pub container: Option<Container>,
}

/// Reference to a named output of another node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputReference {
    pub node_id: String,
    pub var: String,
    pub literal_type: LiteralType,
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.var)
    }
}

/// Data bound to a variable: a literal, a promise, or a nesting of both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingData {
    Scalar(Literal),
    Promise(OutputReference),
    Collection(Vec<BindingData>),
    Map(BTreeMap<String, BindingData>),
}

impl BindingData {
    pub fn collection(items: impl IntoIterator<Item = BindingData>) -> Self {
        BindingData::Collection(items.into_iter().collect())
    }

    /// Resolve to a literal; fails if any promise is still pending
    pub fn to_literal(&self) -> FlowResult<Literal> {
        match self {
            BindingData::Scalar(literal) => Ok(literal.clone()),
            BindingData::Promise(reference) => {
                Err(FlowError::UnresolvedPromise(reference.to_string()))
            }
            BindingData::Collection(items) => items
                .iter()
                .map(BindingData::to_literal)
                .collect::<FlowResult<Vec<_>>>()
                .map(Literal::Collection),
            BindingData::Map(map) => map
                .iter()
                .map(|(k, v)| v.to_literal().map(|lit| (k.clone(), lit)))
                .collect::<FlowResult<BTreeMap<_, _>>>()
                .map(Literal::Map),
        }
    }

    /// All promises reachable from this binding, in order
    pub fn promises(&self) -> Vec<&OutputReference> {
        let mut found = Vec::new();
        self.collect_promises(&mut found);
        found
    }

    fn collect_promises<'a>(&'a self, found: &mut Vec<&'a OutputReference>) {
        match self {
            BindingData::Scalar(_) => {}
            BindingData::Promise(reference) => found.push(reference),
            BindingData::Collection(items) => {
                for item in items {
                    item.collect_promises(found);
                }
            }
            BindingData::Map(map) => {
                for value in map.values() {
                    value.collect_promises(found);
                }
            }
        }
    }

    /// Check the binding against a declared type without resolving promises
    pub fn conforms_to(&self, expected: &LiteralType) -> bool {
        match (self, expected) {
            (BindingData::Scalar(literal), _) => expected.accepts(literal),
            (BindingData::Promise(reference), _) => reference.literal_type == *expected,
            (BindingData::Collection(items), LiteralType::Collection(inner)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            (BindingData::Map(map), LiteralType::Map(inner)) => {
                map.values().all(|value| value.conforms_to(inner))
            }
            _ => false,
        }
    }

    /// Short description used in error messages
    pub fn kind(&self) -> String {
        match self {
            BindingData::Scalar(literal) => literal.kind(),
            BindingData::Promise(reference) => format!("promise<{}>", reference.literal_type),
            BindingData::Collection(_) => "list".to_string(),
            BindingData::Map(_) => "map".to_string(),
        }
    }
}

/// A variable bound to data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub var: String,
    pub binding: BindingData,
}

/// What a node runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeTarget {
    Task(Identifier),
    Workflow(Identifier),
}

impl NodeTarget {
    pub fn id(&self) -> &Identifier {
        match self {
            NodeTarget::Task(id) | NodeTarget::Workflow(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub name: String,
    #[serde(default)]
    pub retries: u32,
}

/// One invocation of an entity inside a compiled graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub metadata: NodeMetadata,
    pub inputs: Vec<Binding>,
    pub upstream_node_ids: Vec<String>,
    pub target: NodeTarget,
}

/// Compiled workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub id: Identifier,
    pub interface: TypedInterface,
    pub nodes: Vec<Node>,
    pub outputs: Vec<Binding>,
}

/// A workflow together with everything it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowClosure {
    pub workflow: WorkflowSpec,
    pub tasks: Vec<TaskTemplate>,
    pub subworkflows: Vec<WorkflowSpec>,
}

/// Expansion result of a dynamic task: the subgraph to run in its place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicJobSpec {
    /// One node per child invocation, in invocation order
    pub nodes: Vec<Node>,
    /// Unique task templates referenced by the nodes
    pub tasks: Vec<TaskTemplate>,
    /// Bindings of the dynamic task's outputs to node outputs
    pub outputs: Vec<Binding>,
    pub min_successes: usize,
    pub subworkflows: Vec<WorkflowSpec>,
}

impl DynamicJobSpec {
    pub fn task(&self, id: &Identifier) -> Option<&TaskTemplate> {
        self.tasks.iter().find(|task| task.id == *id)
    }
}
