//! Token counting for budget decisions.
//!
//! The assembler treats a [`TokenCounter`] as ground truth. Hosts that know
//! their model's tokenizer should plug in an exact counter; the
//! [`HeuristicCounter`] is a dependency-free default that approximates BPE
//! tokenizers at roughly four characters per token.

use crate::error::Result;
use crate::message::ChatMessage;

/// Counts the tokens a message sequence costs in the target model.
pub trait TokenCounter {
    /// Count the tokens of `messages`, including per-message framing.
    ///
    /// # Errors
    /// Implementations return [`crate::HearthError::RenderFailure`] when the
    /// messages cannot be measured.
    fn count(&self, messages: &[ChatMessage]) -> Result<usize>;

    /// Count the tokens of a bare string, without any message framing.
    ///
    /// # Errors
    /// Same as [`TokenCounter::count`].
    fn count_text(&self, text: &str) -> Result<usize>;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count(&self, messages: &[ChatMessage]) -> Result<usize> {
        (**self).count(messages)
    }

    fn count_text(&self, text: &str) -> Result<usize> {
        (**self).count_text(text)
    }
}

/// Framing tokens around every message (`<|start|>role ... <|end|>`).
pub const PER_MESSAGE_OVERHEAD: usize = 3;
/// Tokens priming the assistant's reply.
pub const REPLY_PRIMING: usize = 3;

/// Character-based estimate: one token per four characters, rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Chat-format token estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, messages: &[ChatMessage]) -> Result<usize> {
        let body: usize = messages
            .iter()
            .map(|m| PER_MESSAGE_OVERHEAD + estimate_tokens(m.role.as_str()) + estimate_tokens(&m.content))
            .sum();
        Ok(body + REPLY_PRIMING)
    }

    fn count_text(&self, text: &str) -> Result<usize> {
        Ok(estimate_tokens(text))
    }
}
