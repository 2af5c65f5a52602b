//! AI task aggregate implementation.

use chrono::{DateTime, Utc};
use common::UniqueEntityId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::{AggregateRoot, EventSource, WeakEventQueue};
use crate::events::DomainEvents;
use crate::guard;
use crate::value_object::OpenMap;

use super::{AiError, AiTaskEvent, AiTaskStatus, AiTaskType, Result, TokensUsage};

/// State of an AI task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTaskProps {
    pub tenant_id: Option<String>,
    pub project_id: Option<String>,
    #[serde(rename = "type")]
    pub task_type: AiTaskType,
    pub status: AiTaskStatus,

    /// Request payload; holds at least `config.provider`, `config.model`
    /// and a non-empty `messages` array.
    pub payload: OpenMap,

    pub result: Option<OpenMap>,
    pub error_message: Option<String>,
    pub tokens_usage: Option<TokensUsage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Input for [`AiTask::create`].
///
/// `task_type` and `payload` are optional here so that missing values are
/// reported as validation errors rather than being unrepresentable.
#[derive(Debug, Clone, Default)]
pub struct CreateAiTask {
    pub tenant_id: Option<String>,
    pub project_id: Option<String>,
    pub task_type: Option<AiTaskType>,
    pub payload: Option<Value>,
    pub now: Option<DateTime<Utc>>,
}

impl CreateAiTask {
    pub fn new(task_type: AiTaskType, payload: Value) -> Self {
        Self {
            task_type: Some(task_type),
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Input for [`AiTask::complete`].
#[derive(Debug, Clone, Default)]
pub struct CompleteAiTask {
    pub result: OpenMap,
    pub tokens_usage: Option<TokensUsage>,
    pub now: Option<DateTime<Utc>>,
}

impl CompleteAiTask {
    pub fn new(result: OpenMap) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub fn with_tokens_usage(mut self, tokens_usage: TokensUsage) -> Self {
        self.tokens_usage = Some(tokens_usage);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Input for [`AiTask::fail`].
#[derive(Debug, Clone, Default)]
pub struct FailAiTask {
    pub reason: String,
    pub now: Option<DateTime<Utc>>,
}

impl FailAiTask {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            now: None,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Persistable form of an [`AiTask`]: its id and props, without pending
/// events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiTaskSnapshot {
    pub id: UniqueEntityId,
    #[serde(flatten)]
    pub props: AiTaskProps,
}

/// AI task aggregate root.
///
/// A unit of LLM work (chat, embedding or RAG) that moves through
/// `queued → running → completed | failed`, or straight from `queued` to
/// `failed`. Every transition queues one event and marks the task for
/// dispatch on the [`DomainEvents`] passed in.
#[derive(Debug)]
pub struct AiTask {
    root: AggregateRoot<AiTaskProps, AiTaskEvent>,
}

// Query methods
impl AiTask {
    pub fn id(&self) -> &UniqueEntityId {
        self.root.id()
    }

    /// Returns the task's state.
    pub fn props(&self) -> &AiTaskProps {
        self.root.props()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.props().tenant_id.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.props().project_id.as_deref()
    }

    pub fn task_type(&self) -> AiTaskType {
        self.props().task_type
    }

    pub fn status(&self) -> AiTaskStatus {
        self.props().status
    }

    pub fn payload(&self) -> &OpenMap {
        &self.props().payload
    }

    pub fn result(&self) -> Option<&OpenMap> {
        self.props().result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.props().error_message.as_deref()
    }

    pub fn tokens_usage(&self) -> Option<TokensUsage> {
        self.props().tokens_usage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.props().created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.props().updated_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.props().started_at
    }

    /// Returns true if the task is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Compares identities only.
    pub fn equals(&self, other: Option<&AiTask>) -> bool {
        self.root.equals(other.map(|other| &other.root))
    }

    /// Returns a copy of the pending events.
    pub fn domain_events(&self) -> Vec<AiTaskEvent> {
        self.root.domain_events()
    }

    pub fn pending_event_count(&self) -> usize {
        self.root.pending_event_count()
    }

    /// Returns the pending events and clears the queue.
    pub fn pull_domain_events(&mut self) -> Vec<AiTaskEvent> {
        self.root.pull_domain_events()
    }

    pub fn clear_domain_events(&mut self) {
        self.root.clear_domain_events();
    }

    /// Returns the persistable form of the task.
    pub fn snapshot(&self) -> AiTaskSnapshot {
        AiTaskSnapshot {
            id: self.id().clone(),
            props: self.props().clone(),
        }
    }

    /// Rebuilds a task from a snapshot. The restored task has no pending
    /// events and is not marked for dispatch.
    pub fn from_snapshot(snapshot: AiTaskSnapshot) -> Self {
        Self {
            root: AggregateRoot::new(snapshot.props, Some(snapshot.id)),
        }
    }
}

// Command methods
impl AiTask {
    /// Validates the input and creates a queued task.
    ///
    /// On success the task holds one `AiTaskCreated` event and is marked
    /// for dispatch. On a failed check no task exists.
    pub fn create(params: CreateAiTask, events: &mut DomainEvents<AiTaskEvent>) -> Result<Self> {
        let task_type = guard::against_none(params.task_type, "type")?;
        let payload = guard::against_none(params.payload.filter(|p| !p.is_null()), "payload")?;
        let payload = OpenMap::from_value(payload, "payload")?;

        let provider = guard::against_null(payload.pointer("/config/provider"), "payload.config.provider")?;
        guard::against_empty_string(provider, "payload.config.provider")?;
        let model = guard::against_null(payload.pointer("/config/model"), "payload.config.model")?;
        guard::against_empty_string(model, "payload.config.model")?;
        let messages = guard::against_null(payload.get("messages"), "payload.messages")?;
        guard::against_empty_array(messages, "payload.messages")?;

        let now = params.now.unwrap_or_else(Utc::now);
        let props = AiTaskProps {
            tenant_id: params.tenant_id,
            project_id: params.project_id,
            task_type,
            status: AiTaskStatus::Queued,
            payload,
            result: None,
            error_message: None,
            tokens_usage: None,
            created_at: now,
            updated_at: now,
            started_at: None,
        };

        let mut task = Self {
            root: AggregateRoot::new(props, None),
        };
        let event = AiTaskEvent::created(
            task.id().clone(),
            task_type,
            task.props().project_id.clone(),
            now,
        );
        task.raise(event, events);

        tracing::debug!(task_id = %task.id(), task_type = %task_type, "ai task created");
        Ok(task)
    }

    /// Moves a queued task to running.
    pub fn start(
        &mut self,
        now: Option<DateTime<Utc>>,
        events: &mut DomainEvents<AiTaskEvent>,
    ) -> Result<()> {
        self.ensure(self.status().can_start(), "start")?;

        let now = now.unwrap_or_else(Utc::now);
        let props = self.root.props_mut();
        props.status = AiTaskStatus::Running;
        props.started_at = Some(now);
        props.updated_at = now;

        let event = AiTaskEvent::started(self.id().clone(), now);
        self.raise(event, events);
        Ok(())
    }

    /// Records the result of a running task.
    pub fn complete(
        &mut self,
        params: CompleteAiTask,
        events: &mut DomainEvents<AiTaskEvent>,
    ) -> Result<()> {
        self.ensure(self.status().can_complete(), "complete")?;

        let now = params.now.unwrap_or_else(Utc::now);
        let props = self.root.props_mut();
        props.status = AiTaskStatus::Completed;
        props.result = Some(params.result);
        props.tokens_usage = params.tokens_usage;
        props.updated_at = now;

        let event = AiTaskEvent::completed(self.id().clone(), params.tokens_usage, now);
        self.raise(event, events);
        Ok(())
    }

    /// Marks a queued or running task as failed.
    pub fn fail(&mut self, params: FailAiTask, events: &mut DomainEvents<AiTaskEvent>) -> Result<()> {
        self.ensure(self.status().can_fail(), "fail")?;

        let now = params.now.unwrap_or_else(Utc::now);
        let props = self.root.props_mut();
        props.status = AiTaskStatus::Failed;
        props.error_message = Some(params.reason.clone());
        props.updated_at = now;

        let event = AiTaskEvent::failed(self.id().clone(), params.reason, now);
        self.raise(event, events);
        Ok(())
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> Result<()> {
        if allowed {
            return Ok(());
        }
        Err(AiError::InvalidStateTransition {
            current: self.status(),
            action,
        })
    }

    fn raise(&mut self, event: AiTaskEvent, events: &mut DomainEvents<AiTaskEvent>) {
        self.root.add_domain_event(event);
        events.mark_aggregate_for_dispatch(&*self);
    }
}

impl EventSource<AiTaskEvent> for AiTask {
    fn source_id(&self) -> &UniqueEntityId {
        self.root.source_id()
    }

    fn event_queue(&self) -> WeakEventQueue<AiTaskEvent> {
        self.root.event_queue()
    }
}

impl PartialEq for AiTask {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use crate::events::HandlerError;
    use crate::guard::GuardError;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap()
    }

    fn valid_payload() -> Value {
        json!({
            "config": {"provider": "openai", "model": "gpt-4.1-mini"},
            "messages": [{"role": "user", "content": "Hello"}]
        })
    }

    fn create_task(events: &mut DomainEvents<AiTaskEvent>) -> AiTask {
        let params = CreateAiTask::new(AiTaskType::Chat, valid_payload())
            .tenant("t1")
            .project("p1")
            .at(t(0));
        AiTask::create(params, events).unwrap()
    }

    fn validation_argument(err: AiError) -> String {
        match err {
            AiError::Validation(err) => err.argument().to_string(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_queues_task_with_created_event() {
        let mut events = DomainEvents::new();
        let task = create_task(&mut events);

        assert_eq!(task.status(), AiTaskStatus::Queued);
        assert_eq!(task.task_type(), AiTaskType::Chat);
        assert_eq!(task.tenant_id(), Some("t1"));
        assert_eq!(task.project_id(), Some("p1"));
        assert_eq!(task.created_at(), t(0));
        assert_eq!(task.updated_at(), t(0));
        assert!(task.started_at().is_none());

        let pending = task.domain_events();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event_type(), AiTaskEvent::CREATED);
        assert_eq!(pending[0].aggregate_id(), task.id());
        assert_eq!(pending[0].occurred_at(), t(0));
        assert!(events.is_marked(task.id()));
    }

    #[test]
    fn test_create_requires_type() {
        let mut events = DomainEvents::new();
        let params = CreateAiTask {
            payload: Some(valid_payload()),
            ..CreateAiTask::default()
        };

        let err = AiTask::create(params, &mut events).unwrap_err();
        assert_eq!(err.to_string(), "type is null or undefined");
        assert_eq!(events.marked_count(), 0);
    }

    #[test]
    fn test_create_requires_payload_object() {
        let mut events = DomainEvents::new();

        let missing = CreateAiTask {
            task_type: Some(AiTaskType::Chat),
            payload: Some(Value::Null),
            ..CreateAiTask::default()
        };
        assert_eq!(
            AiTask::create(missing, &mut events).unwrap_err(),
            AiError::Validation(GuardError::Missing {
                argument: "payload".to_string()
            })
        );

        let scalar = CreateAiTask::new(AiTaskType::Chat, json!("hi"));
        assert!(matches!(
            AiTask::create(scalar, &mut events),
            Err(AiError::Validation(GuardError::NotAnObject { .. }))
        ));
    }

    #[test]
    fn test_create_requires_provider_and_model() {
        let mut events = DomainEvents::new();

        let mut payload = valid_payload();
        payload["config"]["provider"] = json!("  ");
        let err = AiTask::create(CreateAiTask::new(AiTaskType::Chat, payload), &mut events).unwrap_err();
        assert_eq!(validation_argument(err), "payload.config.provider");

        let mut payload = valid_payload();
        payload["config"].as_object_mut().unwrap().remove("model");
        let err = AiTask::create(CreateAiTask::new(AiTaskType::Chat, payload), &mut events).unwrap_err();
        assert_eq!(validation_argument(err), "payload.config.model");

        let payload = json!({"messages": [{"role": "user", "content": "x"}]});
        let err = AiTask::create(CreateAiTask::new(AiTaskType::Chat, payload), &mut events).unwrap_err();
        assert_eq!(validation_argument(err), "payload.config.provider");
    }

    #[test]
    fn test_create_requires_non_empty_messages() {
        let mut events = DomainEvents::new();

        let mut payload = valid_payload();
        payload["messages"] = json!([]);
        let err = AiTask::create(CreateAiTask::new(AiTaskType::Rag, payload), &mut events).unwrap_err();
        assert!(matches!(
            err,
            AiError::Validation(GuardError::EmptyArray { .. })
        ));

        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("messages");
        let err = AiTask::create(CreateAiTask::new(AiTaskType::Rag, payload), &mut events).unwrap_err();
        assert_eq!(err.to_string(), "payload.messages is null or undefined");
    }

    #[test]
    fn test_full_lifecycle_emits_events_in_order() {
        let mut events = DomainEvents::new();
        let mut task = create_task(&mut events);

        task.start(Some(t(1)), &mut events).unwrap();
        assert_eq!(task.status(), AiTaskStatus::Running);
        assert_eq!(task.started_at(), Some(t(1)));
        assert_eq!(task.updated_at(), t(1));

        let usage = TokensUsage::create(10, 20).unwrap();
        let result = OpenMap::from_value(json!({"answer": "Hi"}), "result").unwrap();
        task.complete(
            CompleteAiTask::new(result).with_tokens_usage(usage).at(t(2)),
            &mut events,
        )
        .unwrap();

        assert_eq!(task.status(), AiTaskStatus::Completed);
        assert_eq!(task.tokens_usage().map(|u| u.total_tokens()), Some(30));
        assert_eq!(task.result().and_then(|r| r.get("answer")), Some(&json!("Hi")));
        assert_eq!(task.updated_at(), t(2));
        assert!(task.is_terminal());

        let kinds: Vec<_> = task.domain_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            kinds,
            [AiTaskEvent::CREATED, AiTaskEvent::STARTED, AiTaskEvent::COMPLETED]
        );
        assert_eq!(events.marked_count(), 1);
    }

    #[test]
    fn test_start_from_running_is_rejected() {
        let mut events = DomainEvents::new();
        let mut task = create_task(&mut events);
        task.start(Some(t(1)), &mut events).unwrap();

        let err = task.start(Some(t(2)), &mut events).unwrap_err();
        assert_eq!(err.to_string(), "Cannot start AiTask from status running");
        assert_eq!(task.started_at(), Some(t(1)));
        assert_eq!(task.pending_event_count(), 2);
    }

    #[test]
    fn test_complete_requires_running() {
        let mut events = DomainEvents::new();
        let mut task = create_task(&mut events);

        let err = task
            .complete(CompleteAiTask::new(OpenMap::new()), &mut events)
            .unwrap_err();
        assert_eq!(
            err,
            AiError::InvalidStateTransition {
                current: AiTaskStatus::Queued,
                action: "complete",
            }
        );
        assert_eq!(task.status(), AiTaskStatus::Queued);
        assert!(task.result().is_none());
    }

    #[test]
    fn test_cancelled_task_cannot_start() {
        let mut events = DomainEvents::new();
        let mut task = create_task(&mut events);

        task.fail(FailAiTask::new("Cancelled").at(t(3)), &mut events).unwrap();
        assert_eq!(task.status(), AiTaskStatus::Failed);
        assert_eq!(task.error_message(), Some("Cancelled"));
        assert_eq!(task.updated_at(), t(3));

        let err = task.start(None, &mut events).unwrap_err();
        assert_eq!(err.to_string(), "Cannot start AiTask from status failed");

        let kinds: Vec<_> = task.domain_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(kinds, [AiTaskEvent::CREATED, AiTaskEvent::FAILED]);
    }

    #[test]
    fn test_completed_task_cannot_fail() {
        let mut events = DomainEvents::new();
        let mut task = create_task(&mut events);
        task.start(None, &mut events).unwrap();
        task.complete(CompleteAiTask::new(OpenMap::new()), &mut events)
            .unwrap();

        assert!(task.fail(FailAiTask::new("late"), &mut events).is_err());
        assert!(task.error_message().is_none());
    }

    #[test]
    fn test_dispatch_delivers_task_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = DomainEvents::new();
        for kind in [AiTaskEvent::CREATED, AiTaskEvent::STARTED] {
            let seen = Arc::clone(&seen);
            events.register(
                move |event: &AiTaskEvent| {
                    seen.lock().unwrap().push(event.event_type());
                    Ok::<(), HandlerError>(())
                },
                kind,
            );
        }

        let mut task = create_task(&mut events);
        task.start(None, &mut events).unwrap();

        let delivered = events.dispatch_events_for_aggregate(task.id()).unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![AiTaskEvent::CREATED, AiTaskEvent::STARTED]
        );
        assert_eq!(task.pending_event_count(), 0);
        assert!(!events.is_marked(task.id()));
    }

    #[test]
    fn test_snapshot_round_trip_drops_pending_events() {
        let mut events = DomainEvents::new();
        let task = create_task(&mut events);

        let snapshot = task.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["id"], task.id().as_str());
        assert_eq!(json["type"], "chat");
        assert_eq!(json["status"], "queued");
        assert_eq!(json["payload"]["config"]["model"], "gpt-4.1-mini");

        let restored = AiTask::from_snapshot(serde_json::from_value(json).unwrap());
        assert!(restored.equals(Some(&task)));
        assert_eq!(restored.props(), task.props());
        assert_eq!(restored.pending_event_count(), 0);
    }

    #[test]
    fn test_pull_and_clear_domain_events() {
        let mut events = DomainEvents::new();
        let mut task = create_task(&mut events);
        task.start(None, &mut events).unwrap();

        assert_eq!(task.pull_domain_events().len(), 2);
        assert_eq!(task.pending_event_count(), 0);

        task.fail(FailAiTask::new("timeout"), &mut events).unwrap();
        task.clear_domain_events();
        assert!(task.domain_events().is_empty());
    }
}
