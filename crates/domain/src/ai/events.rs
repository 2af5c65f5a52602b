//! Events raised by the AI task aggregate.

use chrono::{DateTime, Utc};
use common::UniqueEntityId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::state::AiTaskType;
use super::value_objects::TokensUsage;

/// All events that can occur on an [`AiTask`](super::AiTask).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AiTaskEvent {
    /// A task was accepted.
    AiTaskCreated(AiTaskCreatedData),

    /// A worker picked up the task.
    AiTaskStarted(AiTaskStartedData),

    /// The task produced a result.
    AiTaskCompleted(AiTaskCompletedData),

    /// The task was rejected or failed while running.
    AiTaskFailed(AiTaskFailedData),
}

impl AiTaskEvent {
    pub const CREATED: &'static str = "AiTaskCreated";
    pub const STARTED: &'static str = "AiTaskStarted";
    pub const COMPLETED: &'static str = "AiTaskCompleted";
    pub const FAILED: &'static str = "AiTaskFailed";

    pub fn created(
        task_id: UniqueEntityId,
        task_type: AiTaskType,
        project_id: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        AiTaskEvent::AiTaskCreated(AiTaskCreatedData {
            task_id,
            task_type,
            project_id,
            occurred_at,
        })
    }

    pub fn started(task_id: UniqueEntityId, occurred_at: DateTime<Utc>) -> Self {
        AiTaskEvent::AiTaskStarted(AiTaskStartedData {
            task_id,
            occurred_at,
        })
    }

    pub fn completed(
        task_id: UniqueEntityId,
        tokens_usage: Option<TokensUsage>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        AiTaskEvent::AiTaskCompleted(AiTaskCompletedData {
            task_id,
            tokens_usage,
            occurred_at,
        })
    }

    pub fn failed(
        task_id: UniqueEntityId,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        AiTaskEvent::AiTaskFailed(AiTaskFailedData {
            task_id,
            reason: reason.into(),
            occurred_at,
        })
    }
}

impl DomainEvent for AiTaskEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AiTaskEvent::AiTaskCreated(_) => Self::CREATED,
            AiTaskEvent::AiTaskStarted(_) => Self::STARTED,
            AiTaskEvent::AiTaskCompleted(_) => Self::COMPLETED,
            AiTaskEvent::AiTaskFailed(_) => Self::FAILED,
        }
    }

    fn aggregate_id(&self) -> &UniqueEntityId {
        match self {
            AiTaskEvent::AiTaskCreated(e) => &e.task_id,
            AiTaskEvent::AiTaskStarted(e) => &e.task_id,
            AiTaskEvent::AiTaskCompleted(e) => &e.task_id,
            AiTaskEvent::AiTaskFailed(e) => &e.task_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AiTaskEvent::AiTaskCreated(e) => e.occurred_at,
            AiTaskEvent::AiTaskStarted(e) => e.occurred_at,
            AiTaskEvent::AiTaskCompleted(e) => e.occurred_at,
            AiTaskEvent::AiTaskFailed(e) => e.occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTaskCreatedData {
    pub task_id: UniqueEntityId,
    pub task_type: AiTaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTaskStartedData {
    pub task_id: UniqueEntityId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTaskCompletedData {
    pub task_id: UniqueEntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_usage: Option<TokensUsage>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTaskFailedData {
    pub task_id: UniqueEntityId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_event_type_names() {
        let id = UniqueEntityId::from("task-1");
        let events = [
            AiTaskEvent::created(id.clone(), AiTaskType::Chat, None, at()),
            AiTaskEvent::started(id.clone(), at()),
            AiTaskEvent::completed(id.clone(), None, at()),
            AiTaskEvent::failed(id.clone(), "boom", at()),
        ];

        let names: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            names,
            ["AiTaskCreated", "AiTaskStarted", "AiTaskCompleted", "AiTaskFailed"]
        );
        assert!(events.iter().all(|e| e.aggregate_id() == &id));
        assert!(events.iter().all(|e| e.occurred_at() == at()));
    }

    #[test]
    fn test_event_serialization() {
        let event = AiTaskEvent::created(
            UniqueEntityId::from("task-1"),
            AiTaskType::Rag,
            Some("p1".to_string()),
            at(),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AiTaskCreated");
        assert_eq!(json["data"]["taskId"], "task-1");
        assert_eq!(json["data"]["taskType"], "rag");
        assert_eq!(json["data"]["projectId"], "p1");

        let back: AiTaskEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_completed_omits_missing_usage() {
        let event = AiTaskEvent::completed(UniqueEntityId::from("t"), None, at());
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["data"].get("tokensUsage").is_none());
    }
}
