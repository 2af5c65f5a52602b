//! Ports to persistence, queueing and language-model providers.

use std::pin::Pin;

use async_trait::async_trait;
use common::UniqueEntityId;
use domain::{AiTask, AiTaskStatus, ChatMessage, LlmConfig, OpenMap, TokensUsage};
use futures_core::Stream;
use serde_json::Value;

use crate::error::PortError;

/// Storage for AI tasks.
#[async_trait]
pub trait AiTaskRepository: Send + Sync {
    /// Inserts or replaces a task.
    async fn save(&self, task: &AiTask) -> Result<(), PortError>;

    /// Loads a task by id.
    async fn find_by_id(&self, id: &UniqueEntityId) -> Result<Option<AiTask>, PortError>;

    /// Returns up to `limit` queued tasks, oldest first.
    ///
    /// Implementations decide how to lock the returned tasks.
    async fn find_queued(&self, limit: usize) -> Result<Vec<AiTask>, PortError>;

    /// Returns a project's tasks in a given status, oldest first.
    async fn find_by_project_and_status(
        &self,
        project_id: &str,
        status: AiTaskStatus,
        limit: Option<usize>,
    ) -> Result<Vec<AiTask>, PortError>;

    /// Returns a tenant's tasks in a given status, oldest first.
    async fn find_by_tenant_and_status(
        &self,
        tenant_id: &str,
        status: AiTaskStatus,
        limit: Option<usize>,
    ) -> Result<Vec<AiTask>, PortError>;
}

/// Job queue used to hand tasks to workers.
#[async_trait]
pub trait QueuePort: Send + Sync {
    /// Adds a job to the named queue.
    ///
    /// `options` carries transport-specific settings such as delays or retry
    /// counts.
    async fn enqueue(
        &self,
        queue_name: &str,
        data: Value,
        options: Option<OpenMap>,
    ) -> Result<(), PortError>;
}

/// A request for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub tenant_id: Option<String>,
    pub project_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub config: LlmConfig,
}

/// A complete model answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub answer: String,
    pub usage: Option<TokensUsage>,
    /// Provider response, untouched.
    pub raw: Option<Value>,
}

/// One piece of a streamed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub content: String,
    /// True on the last chunk of the stream.
    pub done: bool,
}

/// Stream of answer chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, PortError>> + Send>>;

/// A streamed model answer.
pub struct StreamResult {
    /// Finite chunk stream; the last chunk has `done` set.
    pub chunks: ChunkStream,
    pub usage: Option<TokensUsage>,
}

impl std::fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResult")
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// One-shot chat with a model.
#[async_trait]
pub trait AiChatPort: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PortError>;
}

/// Streamed chat with a model.
#[async_trait]
pub trait AiStreamPort: Send + Sync {
    async fn stream(&self, request: ChatRequest) -> Result<StreamResult, PortError>;
}
