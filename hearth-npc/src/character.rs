//! Game payload parsing and per-character state.

use serde::{Deserialize, Serialize};

use hearth_core::affect::AffectVector;
use hearth_core::types::{Participant, RelationshipRank, SituationalSignals};

use crate::error::{NpcError, Result};

/// Character description as sent by the game.
///
/// Flags arrive either as JSON booleans or as the strings `"True"` /
/// `"False"`; the relationship level as a number or numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    /// Character name; also the storage key.
    pub name: String,
    /// Character biography.
    #[serde(default)]
    pub bio: String,
    /// Relationship rank with the player, -4..=4.
    #[serde(default, with = "lenient_int")]
    pub in_game_relationship_level: i32,
    /// The character is fighting.
    #[serde(default, with = "lenient_flag")]
    pub is_in_combat: bool,
    /// The character is hostile toward the player.
    #[serde(default, with = "lenient_flag")]
    pub aggro: bool,
    /// The player has a weapon out.
    #[serde(default, with = "lenient_flag")]
    pub pc_has_weapon_drawn: bool,
    /// The character has a weapon out.
    #[serde(default, with = "lenient_flag")]
    pub has_weapon_draw: bool,
    /// A foe of both is nearby.
    #[serde(default, with = "lenient_flag")]
    pub have_common_enemy_nearby: bool,
    /// Voice model the game assigned.
    #[serde(default)]
    pub in_game_voice_model: String,
    /// Voice model used for synthesis.
    #[serde(default)]
    pub voice_model: String,
}

impl CharacterInfo {
    /// Parse a JSON payload from the game.
    ///
    /// # Errors
    /// `NpcError::InvalidPayload` if the JSON does not describe a character.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| NpcError::InvalidPayload(e.to_string()))
    }

    /// The situation flags for this turn.
    #[must_use]
    pub fn signals(&self) -> SituationalSignals {
        SituationalSignals {
            aggro: self.aggro,
            in_combat: self.is_in_combat,
            player_weapon_drawn: self.pc_has_weapon_drawn,
            npc_weapon_drawn: self.has_weapon_draw,
            common_enemy_nearby: self.have_common_enemy_nearby,
        }
    }
}

/// A character taking part in a conversation.
#[derive(Debug, Clone)]
pub struct Character {
    /// The payload this character was built from.
    pub info: CharacterInfo,
    /// Validated relationship rank.
    pub rank: RelationshipRank,
    /// Language the character speaks.
    pub language: String,
    /// Generic NPCs have no persistent history.
    pub is_generic_npc: bool,
    /// Summary log loaded by the last `set_context`.
    pub conversation_summary: String,
    /// Affect from the last `set_context`, for voice synthesis.
    pub affect: AffectVector,
}

impl Character {
    /// Build a character from a game payload.
    ///
    /// # Errors
    /// `NpcError::InvalidPayload` for an empty name or an out-of-range
    /// relationship level.
    pub fn new(info: CharacterInfo, language: impl Into<String>, is_generic_npc: bool) -> Result<Self> {
        if info.name.trim().is_empty() {
            return Err(NpcError::InvalidPayload("character name is empty".into()));
        }
        let rank = RelationshipRank::new(info.in_game_relationship_level)
            .map_err(|e| NpcError::InvalidPayload(e.to_string()))?;
        Ok(Self {
            info,
            rank,
            language: language.into(),
            is_generic_npc,
            conversation_summary: String::new(),
            affect: AffectVector::neutral(),
        })
    }

    /// Character name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// This character as a prompt participant, carrying its loaded summary.
    #[must_use]
    pub fn participant(&self) -> Participant {
        Participant::new(self.info.name.clone(), self.info.bio.clone())
            .with_summary(self.conversation_summary.clone())
    }
}

mod lenient_flag {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FlagInput {
            Bool(bool),
            Number(i64),
            String(String),
        }

        match FlagInput::deserialize(deserializer)? {
            FlagInput::Bool(value) => Ok(value),
            FlagInput::Number(value) => Ok(value != 0),
            FlagInput::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                other => Err(D::Error::custom(format!("expected True/False, got '{other}'"))),
            },
        }
    }
}

mod lenient_int {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IntInput {
            Number(i32),
            String(String),
        }

        match IntInput::deserialize(deserializer)? {
            IntInput::Number(value) => Ok(value),
            IntInput::String(raw) => raw.trim().parse::<i32>().map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LYDIA: &str = r#"{
        "name": "Lydia",
        "bio": "Housecarl of Whiterun.",
        "in_game_relationship_level": "3",
        "is_in_combat": false,
        "pc_has_weapon_drawn": "True",
        "has_weapon_draw": "False",
        "have_common_enemy_nearby": "False",
        "in_game_voice_model": "FemaleEvenToned",
        "voice_model": "FemaleEvenToned"
    }"#;

    #[test]
    fn parses_game_payload() {
        let info = CharacterInfo::from_json(LYDIA).expect("valid payload");
        assert_eq!(info.name, "Lydia");
        assert_eq!(info.in_game_relationship_level, 3);
        assert!(info.pc_has_weapon_drawn);
        assert!(!info.has_weapon_draw);
        assert!(!info.aggro);

        let signals = info.signals();
        assert!(signals.player_weapon_drawn);
        assert!(!signals.in_combat);
    }

    #[test]
    fn rejects_garbage_flags() {
        let payload = r#"{"name": "Lydia", "is_in_combat": "maybe"}"#;
        assert!(matches!(
            CharacterInfo::from_json(payload),
            Err(NpcError::InvalidPayload(_))
        ));
    }

    #[test]
    fn character_validates_rank() {
        let mut info = CharacterInfo::from_json(LYDIA).expect("valid payload");
        info.in_game_relationship_level = 9;
        assert!(matches!(
            Character::new(info, "English", false),
            Err(NpcError::InvalidPayload(_))
        ));
    }

    #[test]
    fn participant_carries_summary() {
        let info = CharacterInfo::from_json(LYDIA).expect("valid payload");
        let mut lydia = Character::new(info, "English", false).expect("character");
        assert!(lydia.rank.is_close_friend());
        lydia.conversation_summary = "They met at Dragonsreach.\n\n".into();
        let participant = lydia.participant();
        assert_eq!(participant.name, "Lydia");
        assert_eq!(participant.conversation_summary, "They met at Dragonsreach.\n\n");
    }
}
