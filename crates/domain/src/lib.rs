//! Domain-modeling kernel.
//!
//! This crate provides the building blocks for invariant-enforcing business
//! objects:
//! - [`result`]: helpers and access rules for two-state outcomes
//! - [`guard`]: precondition checks used by factories
//! - [`value_object`]: structurally compared immutable values
//! - [`entity`] and [`aggregate`]: identity-compared objects and the
//!   aggregate root that owns pending domain events
//! - [`events`]: the deferred domain event dispatcher
//! - [`ai`]: the AI task aggregate with its status machine

pub mod aggregate;
pub mod ai;
pub mod entity;
pub mod events;
pub mod guard;
pub mod result;
pub mod value_object;

pub use aggregate::{AggregateRoot, DomainEvent, EventQueue, EventSource, WeakEventQueue};
pub use ai::{
    AiError, AiTask, AiTaskEvent, AiTaskProps, AiTaskSnapshot, AiTaskStatus, AiTaskType,
    ChatMessage, ChatRole, CompleteAiTask, CreateAiTask, FailAiTask, LlmConfig, ModelName,
    PromptTemplate, ProviderName, TokensUsage,
};
pub use common::UniqueEntityId;
pub use entity::Entity;
pub use events::{DomainEvents, EventHandler, HandlerError};
pub use guard::GuardError;
pub use result::{Outcome, ResultContractError};
pub use value_object::{OpenMap, ValueObject};
