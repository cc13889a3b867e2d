//! One context cycle: recompute affect, then assemble the system prompt.

use tracing::info;

use crate::affect::{AffectVector, compute_affect};
use crate::assembler::{PromptAssembler, RenderedContext};
use crate::error::Result;
use crate::template::PromptTemplates;
use crate::token::TokenCounter;
use crate::trust::TrustPhrase;
use crate::types::{Participant, RelationshipRank, Scene, SituationalSignals, TrustLevel};

/// Inputs for a context cycle.
#[derive(Debug, Clone, Copy)]
pub struct ContextRequest<'a> {
    /// Character whose prompt is built.
    pub speaker: &'a Participant,
    /// Speaker's standing with the player.
    pub rank: RelationshipRank,
    /// Speaker's rapport with the player.
    pub trust: TrustLevel,
    /// Situation this turn.
    pub signals: SituationalSignals,
    /// Everyone in the conversation, speaker included.
    pub participants: &'a [Participant],
    /// Where and when.
    pub scene: &'a Scene,
}

/// Result of a context cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOutcome {
    /// Prompt messages for the model.
    pub context: RenderedContext,
    /// Affect for voice synthesis.
    pub affect: AffectVector,
    /// Trust phrase chosen this cycle.
    pub trust: TrustPhrase,
}

/// Run a full context cycle.
///
/// # Errors
/// Propagates assembler errors (empty party, token counting failure).
pub fn create_context<C: TokenCounter>(
    request: &ContextRequest<'_>,
    templates: &PromptTemplates,
    assembler: &PromptAssembler<C>,
) -> Result<ContextOutcome> {
    let (affect, trust) = compute_affect(request.rank, request.trust, &request.signals);

    info!(trust = %trust, "trust");
    info!(
        angry = affect.angry,
        happy = affect.happy,
        sad = affect.sad,
        surprise = affect.surprise,
        "emotional state"
    );

    let context = assembler.assemble(
        templates,
        request.speaker,
        &trust,
        request.participants,
        request.scene,
    )?;

    info!(tier = ?context.tier, "{}", context.system_prompt());

    Ok(ContextOutcome {
        context,
        affect,
        trust,
    })
}
