//! Conversation persistence.
//!
//! Each character owns two records: the full history, stored as a list of
//! conversations (each a list of turns), and a summary log split across
//! numbered files. New summaries are appended to the highest-numbered
//! file; when that file grows past its token limit the session starts the
//! next one with a condensed summary of everything before it.
//!
//! On disk ([`JsonFileStore`]):
//!
//! ```text
//! <root>/<name>/<name>.json              history
//! <root>/<name>/<name>_summary_<n>.txt   summary log n (latest n wins)
//! ```

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use hearth_core::config::StorageConfig;
use hearth_core::message::ChatMessage;

use crate::error::Result;

/// One saved conversation, minus its system prompt.
pub type Conversation = Vec<ChatMessage>;

/// Storage for conversation histories and summary logs.
pub trait ConversationStore {
    /// All saved conversations for `name`, oldest first; `None` if the
    /// character has never been saved.
    ///
    /// # Errors
    /// Storage or decoding failure.
    fn load_history(&self, name: &str) -> Result<Option<Vec<Conversation>>>;

    /// Append one conversation to the history.
    ///
    /// # Errors
    /// Storage or encoding failure.
    fn append_history(&self, name: &str, conversation: Conversation) -> Result<()>;

    /// Text of the latest summary file; empty if there is none.
    ///
    /// # Errors
    /// Storage failure.
    fn latest_summary(&self, name: &str) -> Result<String>;

    /// Append text to the latest summary file, creating it if needed.
    ///
    /// # Errors
    /// Storage failure.
    fn append_summary(&self, name: &str, text: &str) -> Result<()>;

    /// Start the next summary file with `text`, returning its number.
    ///
    /// # Errors
    /// Storage failure.
    fn start_summary_file(&self, name: &str, text: &str) -> Result<u32>;
}

/// Summary file number used when a character has none yet.
pub const FIRST_SUMMARY_FILE: u32 = 1;

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// Directory-per-character store of JSON histories and text summary logs.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `[storage].conversation_dir`.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.conversation_dir)
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn character_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn history_path(&self, name: &str) -> PathBuf {
        self.character_dir(name).join(format!("{name}.json"))
    }

    /// Path of summary file `number` for `name`.
    #[must_use]
    pub fn summary_path(&self, name: &str, number: u32) -> PathBuf {
        self.character_dir(name).join(format!("{name}_summary_{number}.txt"))
    }

    /// Highest summary file number present, or [`FIRST_SUMMARY_FILE`].
    ///
    /// # Errors
    /// Directory listing failure other than the directory being absent.
    pub fn latest_summary_number(&self, name: &str) -> Result<u32> {
        let entries = match fs::read_dir(self.character_dir(name)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FIRST_SUMMARY_FILE),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{name}_summary_");
        let mut latest = None;
        for entry in entries {
            let file_name = entry?.file_name();
            let number = file_name
                .to_str()
                .and_then(|f| f.strip_prefix(&prefix))
                .and_then(|f| f.strip_suffix(".txt"))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(number) = number {
                latest = latest.max(Some(number));
            }
        }
        Ok(latest.unwrap_or(FIRST_SUMMARY_FILE))
    }
}

impl ConversationStore for JsonFileStore {
    fn load_history(&self, name: &str) -> Result<Option<Vec<Conversation>>> {
        match fs::read_to_string(self.history_path(name)) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn append_history(&self, name: &str, conversation: Conversation) -> Result<()> {
        let mut history = self.load_history(name)?.unwrap_or_default();
        history.push(conversation);

        fs::create_dir_all(self.character_dir(name))?;
        let path = self.history_path(name);
        fs::write(&path, serde_json::to_string_pretty(&history)?)?;
        debug!(path = %path.display(), conversations = history.len(), "history saved");
        Ok(())
    }

    fn latest_summary(&self, name: &str) -> Result<String> {
        let path = self.summary_path(name, self.latest_summary_number(name)?);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn append_summary(&self, name: &str, text: &str) -> Result<()> {
        fs::create_dir_all(self.character_dir(name))?;
        let path = self.summary_path(name, self.latest_summary_number(name)?);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(text.as_bytes())?;
        debug!(path = %path.display(), "summary appended");
        Ok(())
    }

    fn start_summary_file(&self, name: &str, text: &str) -> Result<u32> {
        fs::create_dir_all(self.character_dir(name))?;
        let number = self.latest_summary_number(name)? + 1;
        let path = self.summary_path(name, number);
        fs::write(&path, text)?;
        info!(path = %path.display(), "new summary file started");
        Ok(number)
    }
}

// ---------------------------------------------------------------------------
// InMemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Record {
    history: Option<Vec<Conversation>>,
    summaries: Vec<String>,
}

/// Volatile store for tests and hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Record>>,
}

impl InMemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every summary file for `name`, oldest first.
    #[must_use]
    pub fn summary_files(&self, name: &str) -> Vec<String> {
        self.records
            .lock()
            .get(name)
            .map(|r| r.summaries.clone())
            .unwrap_or_default()
    }
}

impl ConversationStore for InMemoryStore {
    fn load_history(&self, name: &str) -> Result<Option<Vec<Conversation>>> {
        Ok(self.records.lock().get(name).and_then(|r| r.history.clone()))
    }

    fn append_history(&self, name: &str, conversation: Conversation) -> Result<()> {
        self.records
            .lock()
            .entry(name.to_string())
            .or_default()
            .history
            .get_or_insert_with(Vec::new)
            .push(conversation);
        Ok(())
    }

    fn latest_summary(&self, name: &str) -> Result<String> {
        Ok(self
            .records
            .lock()
            .get(name)
            .and_then(|r| r.summaries.last().cloned())
            .unwrap_or_default())
    }

    fn append_summary(&self, name: &str, text: &str) -> Result<()> {
        let mut records = self.records.lock();
        let summaries = &mut records.entry(name.to_string()).or_default().summaries;
        match summaries.last_mut() {
            Some(latest) => latest.push_str(text),
            None => summaries.push(text.to_string()),
        }
        Ok(())
    }

    fn start_summary_file(&self, name: &str, text: &str) -> Result<u32> {
        let mut records = self.records.lock();
        let summaries = &mut records.entry(name.to_string()).or_default().summaries;
        if summaries.is_empty() {
            summaries.push(String::new());
        }
        summaries.push(text.to_string());
        Ok(u32::try_from(summaries.len()).unwrap_or(u32::MAX))
    }
}
