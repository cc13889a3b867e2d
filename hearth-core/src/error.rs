//! Error types for the Hearth core library.

use thiserror::Error;

use crate::template::RenderMode;

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum HearthError {
    /// An input value is outside the domain the mood or assembly rules cover.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A prompt template could not be parsed for its render mode.
    #[error("Invalid {mode} template: {reason}")]
    InvalidTemplate {
        /// Which render mode the template was built for.
        mode: RenderMode,
        /// What is wrong with it.
        reason: String,
    },

    /// The rendered prompt could not be measured against the token budget.
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, HearthError>;
