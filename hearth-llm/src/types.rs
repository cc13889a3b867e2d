//! Core types for LLM requests and responses.

use serde::{Deserialize, Serialize};

use hearth_core::config::LlmConfig;

/// A request to the LLM.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    /// System prompt (instructions for the model).
    pub system: String,
    /// User content (the material to work on).
    pub user: String,
    /// Model override; the client's configured model is used when `None`.
    pub model: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// Create a request with summary-friendly defaults.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            model: None,
            max_tokens: 300,
            temperature: 0.5,
            timeout_ms: 30_000,
        }
    }

    /// Take generation settings from configuration.
    #[must_use]
    pub fn with_config(mut self, config: &LlmConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self.timeout_ms = config.request_timeout_ms;
        self
    }

    /// Route this request to a specific model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub text: String,
    /// How many tokens were generated.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

impl LlmResponse {
    /// Response carrying only text, as produced by scripted models.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}
