//! AI task status machine and task kinds.

use serde::{Deserialize, Serialize};

/// The status of an AI task in its lifecycle.
///
/// State transitions:
/// ```text
/// Queued ──► Running ──► Completed
///   │           │
///   └───────────┴──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiTaskStatus {
    /// Accepted and waiting for a worker.
    #[default]
    Queued,

    /// Picked up by a worker.
    Running,

    /// Finished with a result (terminal state).
    Completed,

    /// Rejected or finished with an error (terminal state).
    Failed,
}

impl AiTaskStatus {
    /// Returns true if the task can start in this status.
    pub fn can_start(&self) -> bool {
        matches!(self, AiTaskStatus::Queued)
    }

    /// Returns true if the task can complete in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, AiTaskStatus::Running)
    }

    /// Returns true if the task can fail in this status.
    ///
    /// A queued task may be rejected before it ever runs.
    pub fn can_fail(&self) -> bool {
        matches!(self, AiTaskStatus::Queued | AiTaskStatus::Running)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AiTaskStatus::Completed | AiTaskStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiTaskStatus::Queued => "queued",
            AiTaskStatus::Running => "running",
            AiTaskStatus::Completed => "completed",
            AiTaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AiTaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of work an AI task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiTaskType {
    Chat,
    Embedding,
    Rag,
}

impl AiTaskType {
    /// Returns the task type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiTaskType::Chat => "chat",
            AiTaskType::Embedding => "embedding",
            AiTaskType::Rag => "rag",
        }
    }
}

impl std::fmt::Display for AiTaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
