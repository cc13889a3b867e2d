//! Per-character session flows: building the prompt at the start of a
//! conversation and saving it at the end.

use tracing::info;

use hearth_core::assembler::{PromptAssembler, RenderedContext};
use hearth_core::config::ContextConfig;
use hearth_core::context::{ContextRequest, create_context};
use hearth_core::message::ChatMessage;
use hearth_core::template::PromptTemplates;
use hearth_core::time::GameHour;
use hearth_core::token::TokenCounter;
use hearth_core::types::{Participant, Scene, TrustLevel};
use hearth_llm::{LanguageModel, Summarizer};

use crate::character::Character;
use crate::error::Result;
use crate::store::ConversationStore;

/// Scene from the game's optional location and time strings, falling back
/// to the configured defaults.
///
/// # Errors
/// `HearthError::InvalidInput` for an unparseable hour.
pub fn scene_from_game(
    location: Option<&str>,
    time: Option<&str>,
    radiant: bool,
    config: &ContextConfig,
) -> Result<Scene> {
    let location = location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(config.default_location.as_str());
    let scene = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => Scene::new(location, raw.parse::<GameHour>()?, config.language.clone())
            .with_reported_time(raw),
        None => Scene::new(location, config.default_time, config.language.clone()),
    };
    Ok(scene.radiant(radiant))
}

/// Token limit for a summary log: `round(tokens_available * pct)`, halves
/// to even.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn summary_limit(tokens_available: usize, summary_limit_pct: f64) -> usize {
    (tokens_available as f64 * summary_limit_pct)
        .round_ties_even()
        .max(0.0) as usize
}

impl Character {
    /// Build the system prompt for a new conversation.
    ///
    /// Trust grows with the number of turns already spoken with the player.
    /// When a history exists the latest summary log is loaded and becomes
    /// this character's memory in the prompt. `companions` are the other
    /// characters present, in order.
    ///
    /// # Errors
    /// Store failures and context cycle failures.
    pub fn set_context<S, C>(
        &mut self,
        store: &S,
        templates: &PromptTemplates,
        assembler: &PromptAssembler<C>,
        companions: &[Participant],
        scene: &Scene,
    ) -> Result<RenderedContext>
    where
        S: ConversationStore + ?Sized,
        C: TokenCounter,
    {
        let trust = match store.load_history(self.name())? {
            Some(history) => {
                self.conversation_summary = store.latest_summary(self.name())?;
                TrustLevel::from(history.iter().map(Vec::len).sum::<usize>())
            }
            None => {
                self.conversation_summary.clear();
                TrustLevel(0)
            }
        };

        let speaker = self.participant();
        let participants: Vec<Participant> = std::iter::once(speaker.clone())
            .chain(companions.iter().cloned())
            .collect();

        let outcome = create_context(
            &ContextRequest {
                speaker: &speaker,
                rank: self.rank,
                trust,
                signals: self.info.signals(),
                participants: &participants,
                scene,
            },
            templates,
            assembler,
        )?;

        self.affect = outcome.affect;
        Ok(outcome.context)
    }

    /// Persist a finished conversation and extend the summary log.
    ///
    /// `messages` is the full exchange including its system prompt, which
    /// is not stored. In group conversations the first character saved
    /// produces the summary and the rest receive it as `shared_summary`.
    /// Returns the summary appended to the log, or `None` for generic NPCs.
    ///
    /// When the log exceeds `round(tokens_available * summary_limit_pct)`
    /// tokens it is condensed into the next summary file.
    ///
    /// # Errors
    /// Store failures, token counting failures, and summarization giving up.
    #[allow(clippy::too_many_arguments)]
    pub async fn save_conversation<S, M, C>(
        &self,
        store: &S,
        summarizer: &Summarizer<M>,
        counter: &C,
        messages: &[ChatMessage],
        tokens_available: usize,
        summary_limit_pct: f64,
        shared_summary: Option<String>,
    ) -> Result<Option<String>>
    where
        S: ConversationStore + ?Sized,
        M: LanguageModel,
        C: TokenCounter,
    {
        if self.is_generic_npc {
            info!(character = self.name(), "A summary will not be saved for this generic NPC.");
            return Ok(None);
        }

        let limit = summary_limit(tokens_available, summary_limit_pct);
        store.append_history(self.name(), messages.get(1..).unwrap_or_default().to_vec())?;

        let previous = store.latest_summary(self.name())?;
        let summary = match shared_summary {
            Some(shared) => shared,
            None => {
                summarizer
                    .summarize(messages, self.name(), &self.language, None)
                    .await?
            }
        };
        store.append_summary(self.name(), &summary)?;

        let log = previous + &summary;
        let tokens = counter.count_text(&log)?;
        if tokens > limit {
            info!(
                character = self.name(),
                tokens,
                limit,
                "Token limit of conversation summaries reached. Creating new summary file..."
            );
            let condensed = summarizer.condense(&log, self.name(), &self.language).await?;
            store.start_summary_file(self.name(), &condensed)?;
        }

        Ok(Some(summary))
    }
}
