//! Application configuration loaded from environment variables.

use std::str::FromStr;

/// Default queue for AI task jobs.
pub const DEFAULT_QUEUE: &str = "ai-tasks";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Application configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `AI_TASKS_QUEUE`: queue used when a request names none (default: `"ai-tasks"`)
/// - `AI_DEFAULT_MAX_TOKENS`: max tokens for one-shot chat (default: `256`)
/// - `AI_DEFAULT_TEMPERATURE`: temperature for one-shot chat (default: `0.0`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub queue_name: String,
    pub default_max_tokens: i64,
    pub default_temperature: f64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            queue_name: lookup("AI_TASKS_QUEUE")
                .filter(|q| !q.trim().is_empty())
                .unwrap_or(defaults.queue_name),
            default_max_tokens: parsed(&lookup, "AI_DEFAULT_MAX_TOKENS")
                .unwrap_or(defaults.default_max_tokens),
            default_temperature: parsed(&lookup, "AI_DEFAULT_TEMPERATURE")
                .unwrap_or(defaults.default_temperature),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_name: DEFAULT_QUEUE.to_string(),
            default_max_tokens: 256,
            default_temperature: 0.0,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}
