//! Affect — "How I feel right now"
//!
//! A bounded four-channel emotional state consumed by the prompt and by
//! voice synthesis. `angry` and `happy` are the two poles of one signed mood
//! scalar, so at most one of them is ever non-zero.
//!
//! The vector is rebuilt from zero every context cycle by [`compute_affect`];
//! nothing carries over between cycles.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::trust::{self, TrustPhrase};
use crate::types::{RelationshipRank, SituationalSignals, TrustLevel};

/// Four clamped emotional magnitudes, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectVector {
    /// Negative pole of the mood scalar.
    pub angry: f32,
    /// Positive pole of the mood scalar.
    pub happy: f32,
    /// Sadness, set (not accumulated) by sadness adjustments.
    pub sad: f32,
    /// Reserved; no current signal sets it.
    pub surprise: f32,
}

impl AffectVector {
    /// A neutral vector.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Signed mood scalar, `happy - angry`.
    #[must_use]
    pub fn mood(&self) -> f32 {
        self.happy - self.angry
    }

    /// Shift the mood scalar by `delta` and collapse it back into the two
    /// poles. Returns the unclamped new scalar.
    pub fn adjust_mood(&mut self, delta: f32) -> f32 {
        let mood = self.mood() + delta;
        if mood > 0.0 {
            self.happy = mood.min(1.0);
            self.angry = 0.0;
        } else {
            self.happy = 0.0;
            self.angry = mood.abs().min(1.0);
        }
        mood
    }

    /// Set sadness to `delta`, capped at 1.0.
    ///
    /// Repeated calls overwrite; sadness never accumulates within a cycle.
    pub fn adjust_sadness(&mut self, delta: f32) -> f32 {
        self.sad = delta.min(1.0);
        delta
    }
}

/// Apply a labelled mood adjustment with a debug trace.
fn mood(affect: &mut AffectVector, delta: f32, reason: &str) {
    debug!(delta, reason, "mood adjustment");
    affect.adjust_mood(delta);
}

fn sadness(affect: &mut AffectVector, delta: f32, reason: &str) {
    debug!(delta, reason, "sadness adjustment");
    affect.adjust_sadness(delta);
}

/// Nemeses relish hostility; close friends are saddened by it.
fn hostility_toward(affect: &mut AffectVector, rank: RelationshipRank, sadness_delta: f32, reason: &str) {
    if rank.is_nemesis() {
        mood(affect, -0.025, "opportunity to kill nemesis");
    } else if rank.is_close_friend() {
        sadness(affect, sadness_delta, reason);
    }
}

/// Drawn weapons raise tension unless both sides face a common enemy.
fn weapon_drawn(affect: &mut AffectVector, rank: RelationshipRank, common_enemy: bool, who: &str) {
    mood(affect, -0.025, who);
    if common_enemy {
        mood(affect, 0.012, "common enemy nearby");
    } else {
        mood(affect, -0.025, "no common enemy nearby");
        hostility_toward(affect, rank, 0.1, "sad action by friend");
    }
}

/// Derive the affect vector and trust phrase for one context cycle.
///
/// Trust biases are applied first, then situational signals in fixed order:
/// aggro, combat, player weapon, character weapon. The function is pure;
/// identical inputs always yield identical outputs.
#[must_use]
pub fn compute_affect(
    rank: RelationshipRank,
    trust: TrustLevel,
    signals: &SituationalSignals,
) -> (AffectVector, TrustPhrase) {
    let mut affect = AffectVector::neutral();

    let framing = trust::frame(rank, trust);
    for bias in &framing.biases {
        mood(&mut affect, bias.delta, bias.reason);
    }

    if signals.aggro {
        mood(&mut affect, -0.2, "player offended character");
        hostility_toward(&mut affect, rank, 0.05, "sad action by friend");
    }

    if signals.in_combat {
        mood(&mut affect, -0.4, "player is in combat with character");
        hostility_toward(&mut affect, rank, 0.1, "sad to battle friend");
    }

    if signals.player_weapon_drawn {
        weapon_drawn(&mut affect, rank, signals.common_enemy_nearby, "player has weapon drawn");
    }

    if signals.npc_weapon_drawn {
        weapon_drawn(&mut affect, rank, signals.common_enemy_nearby, "character has weapon drawn");
    }

    (affect, framing.phrase)
}
