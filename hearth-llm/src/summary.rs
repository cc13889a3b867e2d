//! Conversation summarization policy.
//!
//! Decides which turns are worth summarizing, instructs the model, rewrites
//! its vocabulary into in-world terms, and retries model failures under a
//! bounded [`RetryConfig`].

use tokio::time::sleep;
use tracing::{error, info};

use hearth_core::config::{LlmConfig, RetryConfig};
use hearth_core::message::ChatMessage;

use crate::error::SummaryError;
use crate::model::LanguageModel;
use crate::prompt::{condense_prompt, into_world_terms, summary_prompt};
use crate::types::{LlmRequest, LlmResponse};

/// Conversations with this many turns or fewer are not summarized.
pub const MIN_TURNS: usize = 5;

/// Leading turns skipped: the system context and the opening greeting pair.
const LEADING_TURNS: usize = 3;

/// Trailing turns skipped: the closing goodbye exchange.
const TRAILING_TURNS: usize = 2;

/// Summarizes conversations with a language model.
pub struct Summarizer<M> {
    model: M,
    retry: RetryConfig,
    settings: LlmRequest,
}

impl<M: LanguageModel> Summarizer<M> {
    /// Create a summarizer with default generation settings.
    pub fn new(model: M, retry: RetryConfig) -> Self {
        Self {
            model,
            retry,
            settings: LlmRequest::new(String::new(), String::new()),
        }
    }

    /// Take generation settings (max tokens, temperature, timeout) from
    /// the `[llm]` section.
    #[must_use]
    pub fn with_config(mut self, config: &LlmConfig) -> Self {
        self.settings = self.settings.with_config(config);
        self
    }

    /// The wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The retry policy in force.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Summarize one conversation as a paragraph ending in `"\n\n"`.
    ///
    /// Returns an empty string when the conversation has [`MIN_TURNS`] turns
    /// or fewer. Otherwise only the middle of the conversation is sent,
    /// serialised as a JSON array of `{role, content}`.
    ///
    /// # Errors
    /// `SummaryError::Unavailable` once every attempt has failed.
    pub async fn summarize(
        &self,
        turns: &[ChatMessage],
        name: &str,
        language: &str,
        custom_prompt: Option<&str>,
    ) -> Result<String, SummaryError> {
        if turns.len() <= MIN_TURNS {
            info!(turns = turns.len(), "Conversation summary not saved. Not enough dialogue spoken.");
            return Ok(String::new());
        }

        let spoken = &turns[LEADING_TURNS..turns.len() - TRAILING_TURNS];
        let payload = serde_json::to_string(spoken)?;
        let system = custom_prompt.map_or_else(|| summary_prompt(name, language), str::to_string);

        let response = self.complete_with_retry(system, payload).await?;
        info!(character = name, "Conversation summary saved.");
        Ok(into_world_terms(&response.text, name))
    }

    /// Condense an accumulated summary log into a single paragraph.
    ///
    /// # Errors
    /// `SummaryError::Unavailable` once every attempt has failed.
    pub async fn condense(
        &self,
        summaries: &str,
        name: &str,
        language: &str,
    ) -> Result<String, SummaryError> {
        let response = self
            .complete_with_retry(condense_prompt(name, language), summaries.to_string())
            .await?;
        info!(character = name, "Conversation summaries condensed.");
        Ok(into_world_terms(&response.text, name))
    }

    async fn complete_with_retry(
        &self,
        system: String,
        user: String,
    ) -> Result<LlmResponse, SummaryError> {
        let request = LlmRequest {
            system,
            user,
            ..self.settings.clone()
        };
        let attempts = self.retry.max_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self.model.complete(&request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < attempts {
                        let delay = self.retry.delay_after(attempt);
                        error!(
                            attempt,
                            attempts,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "Failed to summarize conversation: {last_error}. Retrying..."
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        error!(attempts, "Giving up on summarization: {last_error}");
        Err(SummaryError::Unavailable {
            attempts,
            last_error,
        })
    }
}
