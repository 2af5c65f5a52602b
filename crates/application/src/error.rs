//! Application error types.

use domain::{AiError, HandlerError};
use thiserror::Error;

/// Errors reported by port implementations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The repository failed to load or store a task.
    #[error("Repository error: {0}")]
    Repository(String),

    /// The queue rejected a job.
    #[error("Queue error: {0}")]
    Queue(String),

    /// The model provider failed or returned an unusable response.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while running a use case.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Input was rejected by the domain.
    #[error("Domain error: {0}")]
    Domain(#[from] AiError),

    /// An event handler failed while dispatching the task's events.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] HandlerError),

    /// A port call failed.
    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, ApplicationError>;
