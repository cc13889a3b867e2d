//! Trust framing — how a character regards the player.
//!
//! The relationship rank (and, for strangers, accumulated rapport) selects a
//! natural-language phrase that is embedded into the system prompt, plus a
//! sequence of mood biases applied before situational adjustments.
//!
//! Both ladders are ordered tables so thresholds can be read and tested in
//! one place.

use serde::Serialize;
use std::fmt;

use crate::types::{RelationshipRank, TrustLevel};

/// Bias applied to every stranger regardless of rapport.
pub const STRANGER_WARINESS: f32 = -0.10;

/// Stranger tiers: `(rapport below, phrase, mood bias)`.
pub const STRANGER_TIERS: &[(u32, &str, f32)] = &[
    (1, "a suspicious stranger", 0.0),
    (10, "an acquaintance", 0.05),
    (50, "a friend", 0.10),
];

/// Phrase and bias once rapport reaches the last stranger tier.
pub const CLOSE_FRIEND: (&str, f32) = ("a close friend", 0.15);

/// Phrase and bias for lovers (rank 4).
pub const LOVER: (&str, f32) = ("a lover", 0.30);

/// Phrase and bias for any other positive rank.
pub const FRIEND: (&str, f32) = ("a friend", 0.25);

/// Enemy clauses: `(rank below, clause, mood bias)`.
///
/// Thresholds are not exclusive: a nemesis collects every clause in order.
pub const ENEMY_CLAUSES: &[(i32, &str, f32)] = &[
    (0, " with which you wish to quickly end the conversation", -0.15),
    (-1, "; which you distrust", -0.05),
    (-2, "; to who you do not want to help in any shape or form", -0.05),
    (
        -3,
        "; who you would happily destroy if finally having the opportunity to do so",
        -0.10,
    ),
];

/// The relational phrase embedded into single-participant prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustPhrase(String);

impl TrustPhrase {
    /// Phrase text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A labelled mood adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodBias {
    /// Signed change to the mood scalar.
    pub delta: f32,
    /// Why the adjustment happens (logged).
    pub reason: &'static str,
}

/// Phrase plus the ordered biases it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustFraming {
    /// Phrase for the prompt.
    pub phrase: TrustPhrase,
    /// Mood biases, in application order.
    pub biases: Vec<MoodBias>,
}

/// Select the trust phrase and mood biases for a relationship.
#[must_use]
pub fn frame(rank: RelationshipRank, trust: TrustLevel) -> TrustFraming {
    let rank_value = rank.value();

    if rank == RelationshipRank::STRANGER {
        let mut biases = vec![MoodBias {
            delta: STRANGER_WARINESS,
            reason: "stranger wariness",
        }];
        let (phrase, delta) = STRANGER_TIERS
            .iter()
            .find(|(below, _, _)| trust.0 < *below)
            .map_or(CLOSE_FRIEND, |(_, phrase, delta)| (*phrase, *delta));
        biases.push(MoodBias {
            delta,
            reason: "rapport",
        });
        return TrustFraming {
            phrase: TrustPhrase(phrase.to_string()),
            biases,
        };
    }

    if rank == RelationshipRank::LOVER {
        return single(LOVER, "lover");
    }

    if rank_value > 0 {
        return single(FRIEND, "friend");
    }

    let mut phrase = String::from("an enemy");
    let mut biases = Vec::with_capacity(ENEMY_CLAUSES.len());
    for (below, clause, delta) in ENEMY_CLAUSES {
        if rank_value < *below {
            phrase.push_str(clause);
            biases.push(MoodBias {
                delta: *delta,
                reason: "enmity",
            });
        }
    }
    phrase.push(',');

    TrustFraming {
        phrase: TrustPhrase(phrase),
        biases,
    }
}

fn single((phrase, delta): (&str, f32), reason: &'static str) -> TrustFraming {
    TrustFraming {
        phrase: TrustPhrase(phrase.to_string()),
        biases: vec![MoodBias { delta, reason }],
    }
}
