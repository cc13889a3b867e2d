//! Core type definitions shared by the mood engine and the assembler.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HearthError, Result};
use crate::time::GameHour;

// ---------------------------------------------------------------------------
// Relationship
// ---------------------------------------------------------------------------

/// In-game relationship standing between a character and the player.
///
/// The scale is ordinal: `-4` nemesis, `-1` enemy, `0` stranger,
/// `1..=3` friend, `4` lover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct RelationshipRank(i8);

impl RelationshipRank {
    /// Lowest rank the game reports (nemesis).
    pub const MIN: i8 = -4;
    /// Highest rank the game reports (lover).
    pub const MAX: i8 = 4;
    /// Neither friend nor foe.
    pub const STRANGER: Self = Self(0);
    /// Rank reserved for lovers.
    pub const LOVER: Self = Self(4);

    /// Validate a raw rank.
    ///
    /// # Errors
    /// Returns [`HearthError::InvalidInput`] when `rank` is outside `-4..=4`.
    pub fn new(rank: i32) -> Result<Self> {
        i8::try_from(rank)
            .ok()
            .filter(|r| (Self::MIN..=Self::MAX).contains(r))
            .map(Self)
            .ok_or_else(|| {
                HearthError::InvalidInput(format!(
                    "relationship rank {rank} outside {}..={}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    /// Raw rank value.
    #[must_use]
    pub fn value(self) -> i32 {
        i32::from(self.0)
    }

    /// Deep enough enmity that violence is welcome (rank below -3).
    #[must_use]
    pub fn is_nemesis(self) -> bool {
        self.0 < -3
    }

    /// Close enough that hostility hurts (rank above 2).
    #[must_use]
    pub fn is_close_friend(self) -> bool {
        self.0 > 2
    }
}

impl TryFrom<i32> for RelationshipRank {
    type Error = HearthError;

    fn try_from(rank: i32) -> Result<Self> {
        Self::new(rank)
    }
}

impl From<RelationshipRank> for i32 {
    fn from(rank: RelationshipRank) -> Self {
        rank.value()
    }
}

impl fmt::Display for RelationshipRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accumulated rapport with a stranger, counted in prior conversation turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrustLevel(pub u32);

impl From<usize> for TrustLevel {
    fn from(turns: usize) -> Self {
        Self(u32::try_from(turns).unwrap_or(u32::MAX))
    }
}

// ---------------------------------------------------------------------------
// Situation
// ---------------------------------------------------------------------------

/// Per-cycle situational flags sourced from the game engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationalSignals {
    /// The player offended the character.
    pub aggro: bool,
    /// The player and the character are fighting.
    pub in_combat: bool,
    /// The player has a weapon out.
    pub player_weapon_drawn: bool,
    /// The character has a weapon out.
    pub npc_weapon_drawn: bool,
    /// An enemy of both is close by.
    pub common_enemy_nearby: bool,
}

// ---------------------------------------------------------------------------
// Participants & scene
// ---------------------------------------------------------------------------

/// A character taking part in a conversation, as seen by the assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Display name.
    pub name: String,
    /// Background biography.
    pub bio: String,
    /// Summaries of this character's previous conversations.
    pub conversation_summary: String,
}

impl Participant {
    /// Create a participant with no conversation history.
    #[must_use]
    pub fn new(name: impl Into<String>, bio: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bio: bio.into(),
            conversation_summary: String::new(),
        }
    }

    /// Attach previous conversation summaries.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.conversation_summary = summary.into();
        self
    }
}

/// Where and when the conversation takes place.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// In-game location name.
    pub location: String,
    /// In-game hour of day.
    pub time: GameHour,
    /// Time of day as the game reported it, shown verbatim in prompts.
    pub time_text: String,
    /// Language the character must answer in.
    pub language: String,
    /// Radiant dialogue: characters talk among themselves, not to the player.
    pub radiant: bool,
}

impl Scene {
    /// Create a scene addressed to the player.
    #[must_use]
    pub fn new(location: impl Into<String>, time: GameHour, language: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            time,
            time_text: time.to_string(),
            language: language.into(),
            radiant: false,
        }
    }

    /// Keep the game's own rendering of the time, e.g. `"18.75"`.
    #[must_use]
    pub fn with_reported_time(mut self, raw: impl Into<String>) -> Self {
        self.time_text = raw.into();
        self
    }

    /// Mark the scene as radiant dialogue.
    #[must_use]
    pub fn radiant(mut self, radiant: bool) -> Self {
        self.radiant = radiant;
        self
    }
}
