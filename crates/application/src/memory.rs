//! In-memory port implementations for testing and local runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::UniqueEntityId;
use domain::{AiTask, AiTaskSnapshot, AiTaskStatus, ChatRole, OpenMap, TokensUsage};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::error::PortError;
use crate::ports::{
    AiChatPort, AiStreamPort, AiTaskRepository, ChatRequest, ChatResponse, QueuePort,
    StreamChunk, StreamResult,
};

/// In-memory task repository.
///
/// Tasks are stored as snapshots, so loading a task never returns pending
/// events.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAiTaskRepository {
    tasks: Arc<RwLock<HashMap<UniqueEntityId, AiTaskSnapshot>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryAiTaskRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to reject saves.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored tasks.
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Removes all tasks.
    pub async fn clear(&self) {
        self.tasks.write().await.clear();
    }

    async fn select<F>(&self, limit: Option<usize>, keep: F) -> Vec<AiTask>
    where
        F: Fn(&AiTaskSnapshot) -> bool,
    {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<_> = tasks.values().filter(|s| keep(s)).cloned().collect();
        matching.sort_by(|a, b| {
            a.props
                .created_at
                .cmp(&b.props.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = limit {
            matching.truncate(limit);
        }
        matching.into_iter().map(AiTask::from_snapshot).collect()
    }
}

#[async_trait]
impl AiTaskRepository for InMemoryAiTaskRepository {
    async fn save(&self, task: &AiTask) -> Result<(), PortError> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(PortError::Repository(format!("cannot store task {}", task.id())));
        }

        let snapshot = task.snapshot();
        self.tasks.write().await.insert(snapshot.id.clone(), snapshot);
        Ok(())
    }

    async fn find_by_id(&self, id: &UniqueEntityId) -> Result<Option<AiTask>, PortError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(id).cloned().map(AiTask::from_snapshot))
    }

    async fn find_queued(&self, limit: usize) -> Result<Vec<AiTask>, PortError> {
        Ok(self
            .select(Some(limit), |s| s.props.status == AiTaskStatus::Queued)
            .await)
    }

    async fn find_by_project_and_status(
        &self,
        project_id: &str,
        status: AiTaskStatus,
        limit: Option<usize>,
    ) -> Result<Vec<AiTask>, PortError> {
        Ok(self
            .select(limit, |s| {
                s.props.status == status && s.props.project_id.as_deref() == Some(project_id)
            })
            .await)
    }

    async fn find_by_tenant_and_status(
        &self,
        tenant_id: &str,
        status: AiTaskStatus,
        limit: Option<usize>,
    ) -> Result<Vec<AiTask>, PortError> {
        Ok(self
            .select(limit, |s| {
                s.props.status == status && s.props.tenant_id.as_deref() == Some(tenant_id)
            })
            .await)
    }
}

/// A job accepted by [`InMemoryQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueuedJob {
    pub queue_name: String,
    pub data: Value,
    pub options: Option<OpenMap>,
}

/// In-memory job queue that records every accepted job.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    jobs: Arc<RwLock<Vec<EnqueuedJob>>>,
    fail_on_enqueue: Arc<AtomicBool>,
}

impl InMemoryQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the queue to reject jobs.
    pub fn set_fail_on_enqueue(&self, fail: bool) {
        self.fail_on_enqueue.store(fail, Ordering::SeqCst);
    }

    /// Returns all accepted jobs in arrival order.
    pub async fn jobs(&self) -> Vec<EnqueuedJob> {
        self.jobs.read().await.clone()
    }

    /// Returns the jobs accepted on one queue.
    pub async fn jobs_in(&self, queue_name: &str) -> Vec<EnqueuedJob> {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|job| job.queue_name == queue_name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl QueuePort for InMemoryQueue {
    async fn enqueue(
        &self,
        queue_name: &str,
        data: Value,
        options: Option<OpenMap>,
    ) -> Result<(), PortError> {
        if self.fail_on_enqueue.load(Ordering::SeqCst) {
            return Err(PortError::Queue(format!("queue {queue_name} is unavailable")));
        }

        self.jobs.write().await.push(EnqueuedJob {
            queue_name: queue_name.to_string(),
            data,
            options,
        });
        Ok(())
    }
}

/// Offline model that answers with the last user message.
///
/// Token counts are word counts. Streaming yields one chunk per word and a
/// final empty chunk with `done` set.
#[derive(Debug, Clone, Default)]
pub struct EchoChatModel;

impl EchoChatModel {
    pub fn new() -> Self {
        Self
    }

    fn answer(request: &ChatRequest) -> Result<(String, TokensUsage), PortError> {
        let answer = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role() == ChatRole::User)
            .map(|m| m.content().to_string())
            .unwrap_or_default();

        let prompt_words: usize = request
            .messages
            .iter()
            .map(|m| m.content().split_whitespace().count())
            .sum();
        let answer_words = answer.split_whitespace().count();

        let usage = TokensUsage::create(prompt_words as i64, answer_words as i64)
            .map_err(|e| PortError::Provider(e.to_string()))?;
        Ok((answer, usage))
    }
}

#[async_trait]
impl AiChatPort for EchoChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PortError> {
        let (answer, usage) = Self::answer(&request)?;
        let raw = json!({
            "provider": request.config.provider().as_str(),
            "model": request.config.model().as_str(),
        });

        Ok(ChatResponse {
            answer,
            usage: Some(usage),
            raw: Some(raw),
        })
    }
}

#[async_trait]
impl AiStreamPort for EchoChatModel {
    async fn stream(&self, request: ChatRequest) -> Result<StreamResult, PortError> {
        use futures_util::stream;

        let (answer, usage) = Self::answer(&request)?;
        let mut chunks: Vec<_> = answer
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| StreamChunk {
                content: if i == 0 { word.to_string() } else { format!(" {word}") },
                done: false,
            })
            .collect();
        chunks.push(StreamChunk {
            content: String::new(),
            done: true,
        });

        Ok(StreamResult {
            chunks: Box::pin(stream::iter(chunks.into_iter().map(Ok))),
            usage: Some(usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::{
        AiTaskEvent, AiTaskType, ChatMessage, CreateAiTask, DomainEvents, LlmConfig, ModelName,
        ProviderName,
    };
    use futures_util::StreamExt;

    fn task_at(
        events: &mut DomainEvents<AiTaskEvent>,
        minute: u32,
        tenant: &str,
        project: &str,
    ) -> AiTask {
        let payload = json!({
            "config": {"provider": "openai", "model": "gpt-4.1-mini"},
            "messages": [{"role": "user", "content": "hi"}]
        });
        AiTask::create(
            CreateAiTask::new(AiTaskType::Chat, payload)
                .tenant(tenant)
                .project(project)
                .at(Utc.with_ymd_and_hms(2025, 5, 1, 8, minute, 0).unwrap()),
            events,
        )
        .unwrap()
    }

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            tenant_id: None,
            project_id: None,
            messages,
            config: LlmConfig::create(
                ProviderName::create("local").unwrap(),
                ModelName::create("echo").unwrap(),
                0.0,
                None,
                None,
                None,
                OpenMap::new(),
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let repo = InMemoryAiTaskRepository::new();
        let mut events = DomainEvents::new();
        let task = task_at(&mut events, 0, "t1", "p1");

        repo.save(&task).await.unwrap();

        let found = repo.find_by_id(task.id()).await.unwrap().unwrap();
        assert!(found.equals(Some(&task)));
        assert_eq!(found.props(), task.props());
        assert_eq!(found.pending_event_count(), 0);
        assert!(
            repo.find_by_id(&UniqueEntityId::from("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_save_replaces_existing_task() {
        let repo = InMemoryAiTaskRepository::new();
        let mut events = DomainEvents::new();
        let mut task = task_at(&mut events, 0, "t1", "p1");
        repo.save(&task).await.unwrap();

        task.start(None, &mut events).unwrap();
        repo.save(&task).await.unwrap();

        assert_eq!(repo.task_count().await, 1);
        let found = repo.find_by_id(task.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), AiTaskStatus::Running);
    }

    #[tokio::test]
    async fn test_find_queued_is_oldest_first_and_limited() {
        let repo = InMemoryAiTaskRepository::new();
        let mut events = DomainEvents::new();
        let late = task_at(&mut events, 30, "t1", "p1");
        let early = task_at(&mut events, 10, "t1", "p1");
        let mut running = task_at(&mut events, 0, "t1", "p1");
        running.start(None, &mut events).unwrap();

        for task in [&late, &early, &running] {
            repo.save(task).await.unwrap();
        }

        let queued = repo.find_queued(10).await.unwrap();
        let ids: Vec<_> = queued.iter().map(|t| t.id().clone()).collect();
        assert_eq!(ids, vec![early.id().clone(), late.id().clone()]);

        assert_eq!(repo.find_queued(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_project_and_tenant() {
        let repo = InMemoryAiTaskRepository::new();
        let mut events = DomainEvents::new();
        repo.save(&task_at(&mut events, 0, "t1", "p1")).await.unwrap();
        repo.save(&task_at(&mut events, 1, "t1", "p2")).await.unwrap();
        repo.save(&task_at(&mut events, 2, "t2", "p1")).await.unwrap();

        let by_project = repo
            .find_by_project_and_status("p1", AiTaskStatus::Queued, None)
            .await
            .unwrap();
        assert_eq!(by_project.len(), 2);

        let by_tenant = repo
            .find_by_tenant_and_status("t1", AiTaskStatus::Queued, Some(1))
            .await
            .unwrap();
        assert_eq!(by_tenant.len(), 1);
        assert_eq!(by_tenant[0].project_id(), Some("p1"));

        let none = repo
            .find_by_tenant_and_status("t1", AiTaskStatus::Completed, None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_queue_records_jobs_per_queue() {
        let queue = InMemoryQueue::new();
        queue.enqueue("ai-tasks", json!({"n": 1}), None).await.unwrap();
        queue.enqueue("other", json!({"n": 2}), None).await.unwrap();

        assert_eq!(queue.jobs().await.len(), 2);
        let jobs = queue.jobs_in("ai-tasks").await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].data, json!({"n": 1}));
    }

    #[tokio::test]
    async fn test_repository_can_be_made_to_fail() {
        let repo = InMemoryAiTaskRepository::new();
        repo.set_fail_on_save(true);
        let task = task_at(&mut DomainEvents::new(), 0, "t1", "p1");

        let err = repo.save(&task).await.unwrap_err();
        assert!(matches!(err, PortError::Repository(_)));
        assert_eq!(repo.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_queue_can_be_made_to_fail() {
        let queue = InMemoryQueue::new();
        queue.set_fail_on_enqueue(true);

        let err = queue.enqueue("ai-tasks", json!({}), None).await.unwrap_err();
        assert!(matches!(err, PortError::Queue(_)));
        assert!(queue.jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_echo_chat_answers_last_user_message() {
        let model = EchoChatModel::new();
        let messages = vec![
            ChatMessage::create(ChatRole::System, Some("be brief".into()), None).unwrap(),
            ChatMessage::create(ChatRole::User, Some("first".into()), None).unwrap(),
            ChatMessage::create(ChatRole::User, Some("hello there".into()), None).unwrap(),
        ];

        let response = model.chat(request(messages)).await.unwrap();

        assert_eq!(response.answer, "hello there");
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens(), 5);
        assert_eq!(usage.completion_tokens(), 2);
        assert_eq!(response.raw.unwrap()["model"], "echo");
    }

    #[tokio::test]
    async fn test_echo_stream_ends_with_done_chunk() {
        let model = EchoChatModel::new();
        let messages =
            vec![ChatMessage::create(ChatRole::User, Some("one two three".into()), None).unwrap()];

        let result = model.stream(request(messages)).await.unwrap();
        let chunks: Vec<_> = result
            .chunks
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(chunks.len(), 4);
        let text: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(text, "one two three");
        assert!(chunks.last().unwrap().done);
        assert!(chunks[..3].iter().all(|c| !c.done));
        assert_eq!(result.usage.map(|u| u.total_tokens()), Some(6));
    }
}
