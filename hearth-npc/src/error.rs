//! Error types for the integration layer.

use thiserror::Error;

use hearth_core::HearthError;
use hearth_llm::SummaryError;

/// Errors from character sessions and conversation storage.
#[derive(Debug, Error)]
pub enum NpcError {
    /// Context cycle failure.
    #[error(transparent)]
    Core(#[from] HearthError),

    /// Summarization gave up.
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Filesystem error in the conversation store.
    #[error("Conversation store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored history could not be (de)serialised.
    #[error("Conversation history is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The game sent a character payload we cannot use.
    #[error("Invalid character payload: {0}")]
    InvalidPayload(String),

    /// The tracing subscriber could not be installed.
    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, NpcError>;
