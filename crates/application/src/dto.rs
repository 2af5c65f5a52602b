//! Input and output records of the use cases.

use domain::{AiTaskType, ChatRole, OpenMap, TokensUsage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request to create and enqueue an AI task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueAiTaskInput {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(rename = "type", default)]
    pub task_type: Option<AiTaskType>,
    #[serde(default)]
    pub payload: Option<Value>,
    /// Queue to use instead of the configured default.
    #[serde(default)]
    pub queue_name: Option<String>,
    #[serde(default)]
    pub queue_options: Option<OpenMap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueAiTaskOutput {
    pub task_id: String,
}

/// One message of a [`ChatOnceInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageInput {
    pub role: ChatRole,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl ChatMessageInput {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            metadata: None,
        }
    }
}

/// Model settings of a [`ChatOnceInput`].
///
/// Keys other than the known ones are collected into `extra` and handed to
/// the provider untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfigInput {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatConfigInput {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Self::default()
        }
    }
}

/// Request for a single model answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOnceInput {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub messages: Vec<ChatMessageInput>,
    pub config: ChatConfigInput,
}

/// Token counts as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl From<TokensUsage> for UsageOutput {
    fn from(usage: TokensUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens(),
            completion_tokens: usage.completion_tokens(),
            total_tokens: usage.total_tokens(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOnceOutput {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}
