//! Error types for the task pool.

use uuid::Uuid;

use crate::tasks::TaskStatus;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Task repository errors. The in-memory backend never returns these.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Handler registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler {name} already registered")]
    Duplicate { name: String },

    #[error("Handler {name} not found")]
    NotFound { name: String },
}

/// Errors returned by a handler while executing a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler {handler} failed: {reason}")]
    Failed { handler: String, reason: String },

    #[error("Handler {handler} cancelled")]
    Cancelled { handler: String },
}

/// Task lifecycle and facade errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task {id} not found")]
    NotFound { id: Uuid },

    #[error("Task {id} is {status}, expected {expected}")]
    InvalidState {
        id: Uuid,
        status: TaskStatus,
        expected: TaskStatus,
    },

    #[error("Task {id} execution failed: {source}")]
    Execution {
        id: Uuid,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    HandlerResolution(#[from] RegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
