//! Prompt Assembler — system prompt rendering under a token budget.
//!
//! One character talking with the player gets the single-participant
//! template at full detail. Group conversations render the multi-participant
//! template and, while the measured prompt exceeds the budget, degrade:
//!
//! ```text
//! Tier 0: bios + memories            (full detail)
//! Tier 1: bios + memory placeholder  (re-measured)
//! Tier 2: both placeholders          (returned unconditionally)
//! ```
//!
//! The budget is soft. A Tier 2 prompt is returned even if it is still over
//! the limit; callers that need a hard cap must enforce it at the transport.

use serde::Serialize;
use tracing::debug;

use crate::error::{HearthError, Result};
use crate::message::ChatMessage;
use crate::template::{MultiParticipantFields, PromptTemplates, SingleParticipantFields};
use crate::token::TokenCounter;
use crate::trust::TrustPhrase;
use crate::types::{Participant, Scene};

/// Replaces the memory block at Tier 1 and above.
pub const MEMORIES_UNAVAILABLE: &str = "NPC memories not available.";
/// Replaces the biography block at Tier 2.
pub const BIOS_UNAVAILABLE: &str = "NPC backgrounds not available.";
/// Introduces a non-empty single-participant summary.
pub const SUMMARY_PREAMBLE: &str = "Below is a summary for each of your previous conversations:\n\n";
/// How the player is named in participant lists.
pub const PLAYER: &str = "the player";

/// How much optional content was elided to fit the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DegradationTier {
    /// Everything included.
    Full = 0,
    /// Participant memories replaced by a placeholder.
    MemoriesElided = 1,
    /// Memories and biographies replaced by placeholders.
    MemoriesAndBiosElided = 2,
}

/// The assembled prompt: one system message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedContext {
    /// Message sequence handed to the model, currently a single system message.
    pub messages: Vec<ChatMessage>,
    /// Tier that produced the prompt.
    pub tier: DegradationTier,
}

impl RenderedContext {
    fn system(content: String, tier: DegradationTier) -> Self {
        Self {
            messages: vec![ChatMessage::system(content)],
            tier,
        }
    }

    /// The system prompt text.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.messages.first().map_or("", |m| m.content.as_str())
    }

    /// Take ownership of the messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// Token budget for the system prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBudget {
    /// Context window of the target model.
    pub token_limit: usize,
    /// Share of the window the system prompt may use.
    pub prompt_fraction: f64,
}

impl TokenBudget {
    /// Prompt token limit, `round(token_limit * prompt_fraction)` with ties to even.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn prompt_limit(&self) -> usize {
        let limit = (self.token_limit as f64 * self.prompt_fraction).round_ties_even();
        limit.max(0.0) as usize
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            token_limit: 4096,
            prompt_fraction: 0.75,
        }
    }
}

/// Join names as "a, b and c".
#[must_use]
pub fn natural_list(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [head @ .., last] => format!("{} and {last}", head.join(", ")),
    }
}

/// Renders system prompts, degrading group prompts to fit a token budget.
#[derive(Debug, Clone)]
pub struct PromptAssembler<C> {
    counter: C,
    budget: TokenBudget,
}

impl<C: TokenCounter> PromptAssembler<C> {
    /// Create an assembler measuring with `counter` against `budget`.
    #[must_use]
    pub fn new(counter: C, budget: TokenBudget) -> Self {
        Self { counter, budget }
    }

    /// The configured budget.
    #[must_use]
    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    /// Render the system prompt for `speaker` among `participants`.
    ///
    /// `participants` includes the speaker. With exactly one participant the
    /// single template is used and never degraded.
    ///
    /// # Errors
    /// [`HearthError::InvalidInput`] when `participants` is empty, and
    /// [`HearthError::RenderFailure`] when the counter fails.
    pub fn assemble(
        &self,
        templates: &PromptTemplates,
        speaker: &Participant,
        trust: &TrustPhrase,
        participants: &[Participant],
        scene: &Scene,
    ) -> Result<RenderedContext> {
        match participants.len() {
            0 => Err(HearthError::InvalidInput(
                "a conversation needs at least one participant".into(),
            )),
            1 => Ok(Self::assemble_single(templates, speaker, trust, scene)),
            _ => self.assemble_multi(templates, speaker, participants, scene),
        }
    }

    fn assemble_single(
        templates: &PromptTemplates,
        speaker: &Participant,
        trust: &TrustPhrase,
        scene: &Scene,
    ) -> RenderedContext {
        let summary = if speaker.conversation_summary.is_empty() {
            String::new()
        } else {
            format!("{SUMMARY_PREAMBLE}{}", speaker.conversation_summary)
        };

        let content = templates.single.render(&SingleParticipantFields {
            name: &speaker.name,
            bio: &speaker.bio,
            trust: trust.as_str(),
            location: &scene.location,
            time: &scene.time_text,
            time_group: scene.time.time_group(),
            language: &scene.language,
            conversation_summary: &summary,
        });
        RenderedContext::system(content, DegradationTier::Full)
    }

    fn assemble_multi(
        &self,
        templates: &PromptTemplates,
        speaker: &Participant,
        participants: &[Participant],
        scene: &Scene,
    ) -> Result<RenderedContext> {
        let names: Vec<&str> = participants.iter().map(|p| p.name.as_str()).collect();
        let names_list = natural_list(&names);
        let names_with_player = if scene.radiant {
            names_list.clone()
        } else {
            let mut with_player = Vec::with_capacity(names.len() + 1);
            with_player.push(PLAYER);
            with_player.extend_from_slice(&names);
            natural_list(&with_player)
        };

        let bios = block(participants, |p| &p.bio);
        let memories = block(participants, |p| &p.conversation_summary);

        let render = |bios: &str, conversation_summaries: &str| {
            templates.multi.render(&MultiParticipantFields {
                name: &speaker.name,
                names: &names_list,
                names_with_player: &names_with_player,
                language: &scene.language,
                location: &scene.location,
                time: &scene.time_text,
                time_group: scene.time.time_group(),
                bios,
                conversation_summaries,
            })
        };
        let limit = self.budget.prompt_limit();

        let full = render(&bios, &memories);
        let count = self.measure(&full)?;
        if count <= limit {
            debug!(count, limit, "group prompt fits at full detail");
            return Ok(RenderedContext::system(full, DegradationTier::Full));
        }

        let without_memories = render(&bios, MEMORIES_UNAVAILABLE);
        let count = self.measure(&without_memories)?;
        if count <= limit {
            debug!(count, limit, "group prompt fits without memories");
            return Ok(RenderedContext::system(
                without_memories,
                DegradationTier::MemoriesElided,
            ));
        }

        debug!(count, limit, "group prompt over budget, eliding backgrounds");
        Ok(RenderedContext::system(
            render(BIOS_UNAVAILABLE, MEMORIES_UNAVAILABLE),
            DegradationTier::MemoriesAndBiosElided,
        ))
    }

    fn measure(&self, content: &str) -> Result<usize> {
        self.counter
            .count(&[ChatMessage::system(content)])
            .map_err(|e| match e {
                failure @ HearthError::RenderFailure(_) => failure,
                other => HearthError::RenderFailure(other.to_string()),
            })
    }
}

/// One `"<name>: <text>"` line per participant.
fn block(participants: &[Participant], text: impl Fn(&Participant) -> &String) -> String {
    participants
        .iter()
        .map(|p| format!("{}: {}", p.name, text(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::time::GameHour;
    use crate::token::HeuristicCounter;
    use crate::trust;
    use crate::types::{RelationshipRank, TrustLevel};

    /// Returns scripted counts and records what it measured.
    struct ScriptedCounter {
        counts: RefCell<VecDeque<usize>>,
        seen: RefCell<Vec<String>>,
    }

    impl ScriptedCounter {
        fn new(counts: &[usize]) -> Self {
            Self {
                counts: RefCell::new(counts.iter().copied().collect()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl TokenCounter for ScriptedCounter {
        fn count(&self, messages: &[ChatMessage]) -> Result<usize> {
            self.seen.borrow_mut().push(messages[0].content.clone());
            self.counts
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| HearthError::RenderFailure("script exhausted".into()))
        }

        fn count_text(&self, text: &str) -> Result<usize> {
            self.count(&[ChatMessage::system(text)])
        }
    }

    struct BrokenCounter;

    impl TokenCounter for BrokenCounter {
        fn count(&self, _: &[ChatMessage]) -> Result<usize> {
            Err(HearthError::Config("tokenizer missing".into()))
        }

        fn count_text(&self, _: &str) -> Result<usize> {
            Err(HearthError::Config("tokenizer missing".into()))
        }
    }

    fn templates() -> PromptTemplates {
        PromptTemplates::new(
            "{name} ({bio}) meets {trust} in {location} {time_group}. {conversation_summary}",
            "{name} with {names_w_player} [{names}] in {location}.\nBIOS:\n{bios}\nMEM:\n{conversation_summaries}",
        )
        .expect("valid templates")
    }

    fn scene() -> Scene {
        Scene::new("Whiterun", GameHour::new(9).expect("valid"), "English")
    }

    fn trio() -> Vec<Participant> {
        vec![
            Participant::new("Lydia", "Housecarl.").with_summary("Fought a dragon."),
            Participant::new("Farengar", "Court wizard.").with_summary("Studied a stone."),
            Participant::new("Irileth", "Housecarl to the Jarl.").with_summary("Guarded the hall."),
        ]
    }

    fn trust_phrase() -> TrustPhrase {
        trust::frame(RelationshipRank::STRANGER, TrustLevel(75)).phrase
    }

    #[test]
    fn natural_lists() {
        assert_eq!(natural_list(&[]), "");
        assert_eq!(natural_list(&["Lydia"]), "Lydia");
        assert_eq!(natural_list(&["Lydia", "Farengar"]), "Lydia and Farengar");
        assert_eq!(
            natural_list(&["the player", "Lydia", "Farengar"]),
            "the player, Lydia and Farengar"
        );
    }

    #[test]
    fn budget_rounds_fraction() {
        assert_eq!(TokenBudget::default().prompt_limit(), 3072);
        let odd = TokenBudget {
            token_limit: 4095,
            prompt_fraction: 0.5,
        };
        // 2047.5 rounds to even
        assert_eq!(odd.prompt_limit(), 2048);
    }

    #[test]
    fn budget_fraction_keeps_double_precision() {
        let budget = |token_limit, prompt_fraction| TokenBudget {
            token_limit,
            prompt_fraction,
        };
        assert_eq!(budget(4070, 0.45).prompt_limit(), 1832);
        assert_eq!(budget(30, 0.45).prompt_limit(), 14);
        assert_eq!(budget(25, 0.1).prompt_limit(), 2);
        assert_eq!(budget(15, 0.3).prompt_limit(), 4);
    }

    #[test]
    fn single_participant_never_measured() {
        let counter = ScriptedCounter::new(&[]);
        let assembler = PromptAssembler::new(&counter, TokenBudget::default());
        let speaker = Participant::new("Lydia", "Housecarl.");

        let ctx = assembler
            .assemble(&templates(), &speaker, &trust_phrase(), &[speaker.clone()], &scene())
            .expect("single render");

        assert_eq!(ctx.tier, DegradationTier::Full);
        assert_eq!(
            ctx.system_prompt(),
            "Lydia (Housecarl.) meets a close friend in Whiterun in the morning. "
        );
        assert!(counter.seen.borrow().is_empty());
    }

    #[test]
    fn single_participant_summary_gets_preamble() {
        let speaker = Participant::new("Lydia", "Housecarl.").with_summary("We met at the gate.");
        let assembler = PromptAssembler::new(HeuristicCounter, TokenBudget::default());
        let ctx = assembler
            .assemble(&templates(), &speaker, &trust_phrase(), &[speaker.clone()], &scene())
            .expect("single render");
        assert!(ctx.system_prompt().ends_with(&format!("{SUMMARY_PREAMBLE}We met at the gate.")));
    }

    #[test]
    fn reported_time_is_shown_verbatim() {
        let templates = PromptTemplates::new("{time} o'clock, {time_group}.", "{time} {time_group}")
            .expect("valid templates");
        let evening = Scene::new("Whiterun", GameHour::new(18).expect("valid"), "English")
            .with_reported_time("18.75");
        let assembler = PromptAssembler::new(HeuristicCounter, TokenBudget::default());
        let speaker = Participant::new("Lydia", "Housecarl.");

        let ctx = assembler
            .assemble(&templates, &speaker, &trust_phrase(), &[speaker.clone()], &evening)
            .expect("single render");
        assert_eq!(ctx.system_prompt(), "18.75 o'clock, in the early evening.");

        let party = trio();
        let ctx = assembler
            .assemble(&templates, &party[0], &trust_phrase(), &party, &evening)
            .expect("group render");
        assert_eq!(ctx.system_prompt(), "18.75 in the early evening");
    }

    #[test]
    fn group_prompt_fits_at_full_detail() {
        let counter = ScriptedCounter::new(&[1000]);
        let assembler = PromptAssembler::new(&counter, TokenBudget::default());
        let party = trio();

        let ctx = assembler
            .assemble(&templates(), &party[0], &trust_phrase(), &party, &scene())
            .expect("group render");

        assert_eq!(ctx.tier, DegradationTier::Full);
        let prompt = ctx.system_prompt();
        assert!(prompt.starts_with(
            "Lydia with the player, Lydia, Farengar and Irileth [Lydia, Farengar and Irileth]"
        ));
        assert!(prompt.contains("BIOS:\nLydia: Housecarl.\nFarengar: Court wizard.\nIrileth: Housecarl to the Jarl."));
        assert!(prompt.contains("MEM:\nLydia: Fought a dragon.\nFarengar: Studied a stone."));
    }

    #[test]
    fn radiant_dialogue_leaves_player_out() {
        let counter = ScriptedCounter::new(&[10]);
        let assembler = PromptAssembler::new(&counter, TokenBudget::default());
        let party = trio();
        let ctx = assembler
            .assemble(&templates(), &party[1], &trust_phrase(), &party, &scene().radiant(true))
            .expect("group render");
        assert!(ctx.system_prompt().starts_with(
            "Farengar with Lydia, Farengar and Irileth [Lydia, Farengar and Irileth]"
        ));
    }

    #[test]
    fn over_budget_elides_memories_first() {
        let counter = ScriptedCounter::new(&[5000, 3000]);
        let assembler = PromptAssembler::new(&counter, TokenBudget::default());
        let party = trio();

        let ctx = assembler
            .assemble(&templates(), &party[0], &trust_phrase(), &party, &scene())
            .expect("group render");

        assert_eq!(ctx.tier, DegradationTier::MemoriesElided);
        assert!(ctx.system_prompt().contains(MEMORIES_UNAVAILABLE));
        assert!(ctx.system_prompt().contains("Lydia: Housecarl."));
        assert_eq!(counter.seen.borrow().len(), 2);
    }

    #[test]
    fn still_over_budget_elides_bios_unconditionally() {
        let counter = ScriptedCounter::new(&[5000, 3500]);
        let assembler = PromptAssembler::new(&counter, TokenBudget::default());
        let party = trio();

        let ctx = assembler
            .assemble(&templates(), &party[0], &trust_phrase(), &party, &scene())
            .expect("group render");

        assert_eq!(ctx.tier, DegradationTier::MemoriesAndBiosElided);
        assert!(ctx.system_prompt().contains(BIOS_UNAVAILABLE));
        assert!(ctx.system_prompt().contains(MEMORIES_UNAVAILABLE));
        // Tier 2 is never re-measured.
        assert_eq!(counter.seen.borrow().len(), 2);
    }

    #[test]
    fn count_equal_to_limit_fits() {
        let counter = ScriptedCounter::new(&[3072]);
        let assembler = PromptAssembler::new(&counter, TokenBudget::default());
        let party = trio();
        let ctx = assembler
            .assemble(&templates(), &party[0], &trust_phrase(), &party, &scene())
            .expect("group render");
        assert_eq!(ctx.tier, DegradationTier::Full);
    }

    #[test]
    fn counter_failure_is_render_failure() {
        let assembler = PromptAssembler::new(BrokenCounter, TokenBudget::default());
        let party = trio();
        let err = assembler
            .assemble(&templates(), &party[0], &trust_phrase(), &party, &scene())
            .expect_err("counter fails");
        assert!(matches!(err, HearthError::RenderFailure(_)));
    }

    #[test]
    fn empty_party_is_invalid() {
        let assembler = PromptAssembler::new(HeuristicCounter, TokenBudget::default());
        let err = assembler
            .assemble(
                &templates(),
                &Participant::new("Lydia", ""),
                &trust_phrase(),
                &[],
                &scene(),
            )
            .expect_err("no participants");
        assert!(matches!(err, HearthError::InvalidInput(_)));
    }
}
