//! Application layer for AI task orchestration.
//!
//! This crate wires the domain kernel to the outside world:
//! - [`ports`]: async traits for persistence, queueing and model calls
//! - [`use_cases`]: enqueueing AI tasks and one-shot chat
//! - [`memory`]: in-memory adapters for tests and local runs
//! - [`config`] and [`telemetry`]: environment configuration and tracing setup

pub mod config;
pub mod dto;
pub mod error;
pub mod memory;
pub mod ports;
pub mod telemetry;
pub mod use_cases;

pub use config::{Config, LogFormat};
pub use dto::{
    ChatConfigInput, ChatMessageInput, ChatOnceInput, ChatOnceOutput, EnqueueAiTaskInput,
    EnqueueAiTaskOutput, UsageOutput,
};
pub use error::{ApplicationError, PortError, Result};
pub use memory::{EchoChatModel, EnqueuedJob, InMemoryAiTaskRepository, InMemoryQueue};
pub use ports::{
    AiChatPort, AiStreamPort, AiTaskRepository, ChatRequest, ChatResponse, ChunkStream,
    QueuePort, StreamChunk, StreamResult,
};
pub use use_cases::{ChatOnce, EnqueueAiTask, SharedDomainEvents, shared_domain_events};
