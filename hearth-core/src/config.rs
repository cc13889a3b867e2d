//! Configuration for the Hearth system.
//!
//! Maps directly to `hearth.toml`. Every field has a default, so an empty
//! file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::assembler::TokenBudget;
use crate::time::GameHour;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HearthConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Context cycle and prompt budget.
    #[serde(default)]
    pub context: ContextConfig,
    /// Conversation summarization.
    #[serde(default)]
    pub summary: SummaryConfig,
    /// LLM integration settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Conversation storage.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl HearthConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `HearthError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::HearthError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level or `EnvFilter` directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Context cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Context window of the conversation model, in tokens.
    #[serde(default = "default_4096")]
    pub token_limit: usize,
    /// Share of the window the system prompt may use.
    #[serde(default = "default_0_75")]
    pub prompt_limit_pct: f64,
    /// Location used when the game reports none.
    #[serde(default = "default_location")]
    pub default_location: String,
    /// Hour used when the game reports none.
    #[serde(default = "default_time")]
    pub default_time: GameHour,
    /// Language characters answer in.
    #[serde(default = "default_language")]
    pub language: String,
}

impl ContextConfig {
    /// Token budget for the system prompt.
    #[must_use]
    pub fn budget(&self) -> TokenBudget {
        TokenBudget {
            token_limit: self.token_limit,
            prompt_fraction: self.prompt_limit_pct,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_limit: 4096,
            prompt_limit_pct: 0.75,
            default_location: "Skyrim".to_string(),
            default_time: GameHour::NOON,
            language: "English".to_string(),
        }
    }
}

/// Conversation summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Share of the context window the summary log may grow to before it is
    /// condensed into a new file.
    #[serde(default = "default_0_45")]
    pub summary_limit_pct: f64,
    /// Retry behaviour when the language model fails.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            summary_limit_pct: 0.45,
            retry: RetryConfig::default(),
        }
    }
}

/// Bounded exponential retry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_5")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "default_5000")]
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay.
    #[serde(default = "default_30000")]
    pub max_delay_ms: u64,
    /// Factor applied to the delay after each failure.
    #[serde(default = "default_2_0")]
    pub multiplier: f32,
}

impl RetryConfig {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.initial_delay_ms as f64 * f64::from(self.multiplier.max(1.0)).powi(exponent);
        let capped = scaled.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 5000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

/// LLM integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "ollama", "openai", "none".
    #[serde(default = "default_ollama")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// API key for OpenAI-compatible providers.
    #[serde(default)]
    pub api_key: String,
    /// Model used for summaries.
    #[serde(default = "default_model")]
    pub model: String,
    /// Hard timeout for any LLM call in milliseconds.
    #[serde(default = "default_30000")]
    pub request_timeout_ms: u64,
    /// Transport-level retries inside one call.
    #[serde(default = "default_1")]
    pub max_retries: u32,
    /// Maximum tokens to generate.
    #[serde(default = "default_300")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_0_5")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key: String::new(),
            model: "mistral:7b-instruct".to_string(),
            request_timeout_ms: 30_000,
            max_retries: 1,
            max_tokens: 300,
            temperature: 0.5,
        }
    }
}

/// Conversation storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one sub-directory per character.
    #[serde(default = "default_conversation_dir")]
    pub conversation_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            conversation_dir: "data/conversations".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_location() -> String { "Skyrim".to_string() }
fn default_time() -> GameHour { GameHour::NOON }
fn default_language() -> String { "English".to_string() }
fn default_ollama() -> String { "ollama".to_string() }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "mistral:7b-instruct".to_string() }
fn default_conversation_dir() -> String { "data/conversations".to_string() }
fn default_0_45() -> f64 { 0.45 }
fn default_0_5() -> f32 { 0.5 }
fn default_0_75() -> f64 { 0.75 }
fn default_2_0() -> f32 { 2.0 }
fn default_1() -> u32 { 1 }
fn default_5() -> u32 { 5 }
fn default_300() -> u32 { 300 }
fn default_4096() -> usize { 4096 }
fn default_5000() -> u64 { 5000 }
fn default_30000() -> u64 { 30_000 }
