//! # Hearth Core Library
//!
//! Game-agnostic affect model and prompt assembly for characters that speak
//! through a language model.
//!
//! Every conversational turn starts a fresh *context cycle*:
//!
//! - **Mood** — situational signals and relationship standing are folded
//!   into a bounded [`AffectVector`] plus a [`TrustPhrase`].
//! - **Assembly** — the trust phrase, scene and participant memories are
//!   rendered into a single system message that fits a token budget,
//!   degrading optional content tier by tier when it does not.
//!
//! Nothing here performs network or storage I/O. Token counting is a
//! collaborator behind the [`TokenCounter`] trait.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod affect;
pub mod assembler;
pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod template;
pub mod time;
pub mod token;
pub mod trust;
pub mod types;

pub use affect::{AffectVector, compute_affect};
pub use assembler::{DegradationTier, PromptAssembler, RenderedContext};
pub use config::HearthConfig;
pub use error::HearthError;
pub use message::{ChatMessage, Role};
pub use token::{HeuristicCounter, TokenCounter};
pub use trust::TrustPhrase;
pub use types::*;
