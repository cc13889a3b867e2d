//! # hearth-llm — LLM Abstraction Layer for Hearth
//!
//! Provides a unified completion interface across backends:
//!   - **Ollama** (local, recommended default)
//!   - **OpenAI-compatible API** (also works with Together, OpenRouter, etc.)
//!
//! On top of it sits the conversation summarization policy: which turns are
//! worth summarizing, how the model is instructed, how its wording is
//! normalised, and how failures are retried.
//!
//! # Architecture
//!
//! ```text
//! Summarizer ──▶ LanguageModel (trait) ──▶ LlmClient ──▶ Ollama / OpenAI
//!      │
//!      └── RetryConfig: bounded attempts, capped exponential delay
//! ```

pub mod client;
pub mod error;
pub mod model;
pub mod prompt;
pub mod summary;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::{LlmError, SummaryError};
pub use model::LanguageModel;
pub use summary::Summarizer;
pub use types::{LlmRequest, LlmResponse};
