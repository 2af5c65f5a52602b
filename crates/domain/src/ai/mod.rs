//! AI task aggregate, its events, and the value objects it is built from.

pub mod aggregate;
pub mod events;
pub mod state;
pub mod value_objects;

pub use aggregate::{AiTask, AiTaskProps, AiTaskSnapshot, CompleteAiTask, CreateAiTask, FailAiTask};
pub use events::AiTaskEvent;
pub use state::{AiTaskStatus, AiTaskType};
pub use value_objects::{
    ChatMessage, ChatRole, LlmConfig, ModelName, PromptTemplate, ProviderName, TokensUsage,
};

use thiserror::Error;

use crate::guard::GuardError;

/// Errors raised by the AI domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// A precondition on an argument failed.
    #[error(transparent)]
    Validation(#[from] GuardError),

    #[error("{argument} cannot contain whitespace")]
    ContainsWhitespace { argument: &'static str },

    #[error("Version must be greater than or equal to 1")]
    InvalidVersion { version: i64 },

    #[error("totalTokens {total} does not match promptTokens + completionTokens ({expected})")]
    TotalTokensMismatch { total: u64, expected: u64 },

    /// The task's status does not allow the requested lifecycle step.
    #[error("Cannot {action} AiTask from status {current}")]
    InvalidStateTransition {
        current: AiTaskStatus,
        action: &'static str,
    },
}

/// Result type for AI domain operations.
pub type Result<T> = std::result::Result<T, AiError>;
