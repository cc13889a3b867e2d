//! In-game time of day and its coarse prompt label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};

/// Hour of the in-game day, `0..=24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GameHour(u8);

impl GameHour {
    /// Midday, used when the game does not report a time.
    pub const NOON: Self = Self(12);

    /// Validate an hour.
    ///
    /// # Errors
    /// Returns [`HearthError::InvalidInput`] when `hour > 24`.
    pub fn new(hour: u8) -> Result<Self> {
        if hour > 24 {
            return Err(HearthError::InvalidInput(format!(
                "hour {hour} outside 0..=24"
            )));
        }
        Ok(Self(hour))
    }

    /// Raw hour value.
    #[must_use]
    pub fn hour(self) -> u8 {
        self.0
    }

    /// Coarse label embedded into prompts ("in the morning", "at night", ...).
    #[must_use]
    pub fn time_group(self) -> &'static str {
        match self.0 {
            0..=4 => "at night",
            5..=7 => "early in the morning",
            8..=11 => "in the morning",
            12..=14 => "in the afternoon",
            15..=19 => "in the early evening",
            20..=21 => "in the evening",
            _ => "at night",
        }
    }
}

impl Default for GameHour {
    fn default() -> Self {
        Self::NOON
    }
}

impl TryFrom<u8> for GameHour {
    type Error = HearthError;

    fn try_from(hour: u8) -> Result<Self> {
        Self::new(hour)
    }
}

impl From<GameHour> for u8 {
    fn from(hour: GameHour) -> Self {
        hour.0
    }
}

impl FromStr for GameHour {
    type Err = HearthError;

    /// Parses the game's time payload. Fractional hours are truncated.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let whole = trimmed.split('.').next().unwrap_or(trimmed);
        let hour: u8 = whole
            .parse()
            .map_err(|_| HearthError::InvalidInput(format!("unparseable hour '{s}'")))?;
        Self::new(hour)
    }
}

impl fmt::Display for GameHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
