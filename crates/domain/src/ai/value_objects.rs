//! Value objects for the AI domain.

use serde::{Deserialize, Serialize};

use crate::guard;
use crate::value_object::{OpenMap, ValueObject};

use super::AiError;

/// Largest integer a JSON number holds without precision loss (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

fn validated_name(value: &str, argument: &'static str) -> Result<String, AiError> {
    guard::against_blank(value, argument)?;
    if value.chars().any(char::is_whitespace) {
        return Err(AiError::ContainsWhitespace { argument });
    }
    Ok(value.to_string())
}

/// Name of a language-model provider (e.g. `openai`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderName {
    value: String,
}

impl ProviderName {
    /// Creates a provider name; it must be non-blank and contain no whitespace.
    pub fn create(value: &str) -> Result<Self, AiError> {
        validated_name(value, "ProviderName").map(|value| Self { value })
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl ValueObject for ProviderName {
    type Props = String;

    fn props(&self) -> &String {
        &self.value
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<String> for ProviderName {
    type Error = AiError;

    fn try_from(value: String) -> Result<Self, AiError> {
        Self::create(&value)
    }
}

impl From<ProviderName> for String {
    fn from(name: ProviderName) -> Self {
        name.value
    }
}

/// Name of a model offered by a provider (e.g. `gpt-4.1-mini`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelName {
    value: String,
}

impl ModelName {
    /// Creates a model name; it must be non-blank and contain no whitespace.
    pub fn create(value: &str) -> Result<Self, AiError> {
        validated_name(value, "ModelName").map(|value| Self { value })
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl ValueObject for ModelName {
    type Props = String;

    fn props(&self) -> &String {
        &self.value
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<String> for ModelName {
    type Error = AiError;

    fn try_from(value: String) -> Result<Self, AiError> {
        Self::create(&value)
    }
}

impl From<ModelName> for String {
    fn from(name: ModelName) -> Self {
        name.value
    }
}

/// Token accounting reported by a provider for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TokensUsageRecord")]
pub struct TokensUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl TokensUsage {
    /// Creates a usage record; both counts must lie in `[0, 2^53 - 1]`.
    ///
    /// The total is derived from the two counts.
    pub fn create(prompt_tokens: i64, completion_tokens: i64) -> Result<Self, AiError> {
        let prompt = guard::within(prompt_tokens, 0, MAX_SAFE_INTEGER, "promptTokens")?;
        let completion = guard::within(completion_tokens, 0, MAX_SAFE_INTEGER, "completionTokens")?;

        // Both bounds were checked above, so the casts are lossless.
        let prompt_tokens = prompt as u64;
        let completion_tokens = completion as u64;

        Ok(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        })
    }

    pub fn prompt_tokens(&self) -> u64 {
        self.prompt_tokens
    }

    pub fn completion_tokens(&self) -> u64 {
        self.completion_tokens
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }
}

/// Stored form of [`TokensUsage`]. A stored total must match the counts.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokensUsageRecord {
    prompt_tokens: i64,
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl TryFrom<TokensUsageRecord> for TokensUsage {
    type Error = AiError;

    fn try_from(record: TokensUsageRecord) -> Result<Self, AiError> {
        let usage = Self::create(record.prompt_tokens, record.completion_tokens)?;
        match record.total_tokens {
            Some(total) if total != usage.total_tokens => Err(AiError::TotalTokensMismatch {
                total,
                expected: usage.total_tokens,
            }),
            _ => Ok(usage),
        }
    }
}

impl ValueObject for TokensUsage {
    type Props = TokensUsage;

    fn props(&self) -> &TokensUsage {
        self
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Tool,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
            ChatRole::Tool => "tool",
        }
    }
}

/// One message of a conversation sent to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<OpenMap>,
}

impl ChatMessage {
    /// Creates a chat message; content must be present (it may be empty).
    pub fn create(
        role: ChatRole,
        content: Option<String>,
        metadata: Option<OpenMap>,
    ) -> Result<Self, AiError> {
        let content = guard::against_none(content, "content")?;
        Ok(Self {
            role,
            content,
            metadata,
        })
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> Option<&OpenMap> {
        self.metadata.as_ref()
    }
}

impl ValueObject for ChatMessage {
    type Props = ChatMessage;

    fn props(&self) -> &ChatMessage {
        self
    }
}

/// Settings for one call to a language model.
///
/// Provider-specific settings beyond the common ones are kept in
/// [`LlmConfig::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LlmConfigRecord")]
pub struct LlmConfig {
    provider: ProviderName,
    model: ModelName,
    temperature: f64,
    max_tokens: Option<u64>,
    top_p: Option<f64>,
    stream: Option<bool>,
    #[serde(default)]
    extra: OpenMap,
}

impl LlmConfig {
    /// Creates a model configuration.
    ///
    /// Temperature and top-p must lie in `[0, 1]`; max tokens, when given,
    /// in `[1, 2^53 - 1]`.
    pub fn create(
        provider: ProviderName,
        model: ModelName,
        temperature: f64,
        max_tokens: Option<i64>,
        top_p: Option<f64>,
        stream: Option<bool>,
        extra: OpenMap,
    ) -> Result<Self, AiError> {
        let temperature = guard::within(temperature, 0.0, 1.0, "temperature")?;
        let max_tokens = max_tokens
            .map(|tokens| guard::within(tokens, 1, MAX_SAFE_INTEGER, "maxTokens"))
            .transpose()?
            .map(|tokens| tokens as u64);
        let top_p = top_p
            .map(|top_p| guard::within(top_p, 0.0, 1.0, "topP"))
            .transpose()?;

        Ok(Self {
            provider,
            model,
            temperature,
            max_tokens,
            top_p,
            stream,
            extra,
        })
    }

    pub fn provider(&self) -> &ProviderName {
        &self.provider
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u64> {
        self.max_tokens
    }

    pub fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    pub fn stream(&self) -> Option<bool> {
        self.stream
    }

    /// Returns provider-specific settings.
    pub fn extra(&self) -> &OpenMap {
        &self.extra
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmConfigRecord {
    provider: ProviderName,
    model: ModelName,
    temperature: f64,
    #[serde(default)]
    max_tokens: Option<i64>,
    #[serde(default)]
    top_p: Option<f64>,
    #[serde(default)]
    stream: Option<bool>,
    #[serde(default)]
    extra: OpenMap,
}

impl TryFrom<LlmConfigRecord> for LlmConfig {
    type Error = AiError;

    fn try_from(record: LlmConfigRecord) -> Result<Self, AiError> {
        Self::create(
            record.provider,
            record.model,
            record.temperature,
            record.max_tokens,
            record.top_p,
            record.stream,
            record.extra,
        )
    }
}

impl ValueObject for LlmConfig {
    type Props = LlmConfig;

    fn props(&self) -> &LlmConfig {
        self
    }
}

/// A versioned prompt with named placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PromptTemplateRecord")]
pub struct PromptTemplate {
    name: String,
    description: Option<String>,
    template: String,
    version: u32,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Creates a prompt template; the version must be at least 1.
    pub fn create(
        name: impl Into<String>,
        template: impl Into<String>,
        version: i64,
        variables: Vec<String>,
        description: Option<String>,
    ) -> Result<Self, AiError> {
        let version = u32::try_from(version)
            .ok()
            .filter(|version| *version >= 1)
            .ok_or(AiError::InvalidVersion { version })?;

        Ok(Self {
            name: name.into(),
            description,
            template: template.into(),
            version,
            variables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

#[derive(Deserialize)]
struct PromptTemplateRecord {
    name: String,
    #[serde(default)]
    description: Option<String>,
    template: String,
    version: i64,
    #[serde(default)]
    variables: Vec<String>,
}

impl TryFrom<PromptTemplateRecord> for PromptTemplate {
    type Error = AiError;

    fn try_from(record: PromptTemplateRecord) -> Result<Self, AiError> {
        Self::create(
            record.name,
            record.template,
            record.version,
            record.variables,
            record.description,
        )
    }
}

impl ValueObject for PromptTemplate {
    type Props = PromptTemplate;

    fn props(&self) -> &PromptTemplate {
        self
    }
}
