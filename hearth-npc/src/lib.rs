//! # hearth-npc — Character Integration for Hearth
//!
//! Connects the game-agnostic `hearth-core` context cycle and the
//! `hearth-llm` summarizer to what a game actually sends and stores.
//!
//! ## Architecture
//!
//! ```text
//! game payload ──▶ CharacterInfo ──▶ Character
//!                                      │ set_context ──▶ hearth-core (affect + prompt)
//!                                      │ save_conversation ──▶ hearth-llm (summary)
//!                                      ▼
//!                               ConversationStore (JSON files / in-memory)
//! ```
//!
//! ## Modules
//!
//! - `character` — game payload parsing and the per-character state
//! - `session` — `set_context` / `save_conversation` flows
//! - `store` — conversation history and summary log persistence
//! - `telemetry` — `tracing` subscriber setup

pub mod character;
pub mod error;
pub mod session;
pub mod store;
pub mod telemetry;

pub use character::{Character, CharacterInfo};
pub use error::{NpcError, Result};
pub use store::{ConversationStore, InMemoryStore, JsonFileStore};
