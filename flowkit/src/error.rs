// Error Types
// Errors surfaced while converting literals, compiling nodes and dispatching entities

use crate::config::ConfigError;

use thiserror::Error;

/// Errors that can occur anywhere in the SDK
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Missing input '{0}'")]
    MissingInput(String),

    #[error("Unexpected input '{0}'")]
    UnexpectedInput(String),

    #[error("Missing output '{0}'")]
    MissingOutput(String),

    #[error("Unexpected output '{0}'")]
    UnexpectedOutput(String),

    #[error("Type mismatch for '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Cannot convert literal: {0}")]
    Conversion(String),

    #[error("Promise for {0} cannot be resolved to a value outside of a running node")]
    UnresolvedPromise(String),

    #[error("Serialization settings are required to compile '{0}'")]
    MissingSerializationSettings(String),

    #[error("Fast serialization is enabled but additional context '{0}' is missing")]
    MissingAdditionalContext(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Entity already registered: {0}")]
    DuplicateEntity(String),

    #[error("Invalid loader arguments: {0}")]
    InvalidLoaderArgs(String),

    #[error("'{0}' cannot be dispatched as a task")]
    NotDispatchable(String),

    #[error("Task '{task}' failed: {message}")]
    User { task: String, message: String },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        FlowError::TypeMismatch {
            name: name.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Error raised from inside a task body
    pub fn user(task: impl Into<String>, message: impl Into<String>) -> Self {
        FlowError::User {
            task: task.into(),
            message: message.into(),
        }
    }
}

/// Result alias used across the crate
pub type FlowResult<T> = Result<T, FlowError>;
