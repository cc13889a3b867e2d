//! Prompt templates with statically enumerated placeholders.
//!
//! A template is parsed once into literal and field segments. Each render
//! mode has its own closed placeholder set, so a template that names an
//! unknown placeholder is rejected when it is built rather than when it is
//! rendered. `{{` and `}}` produce literal braces.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{HearthError, Result};

/// Which participant layout a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// One character talking with the player.
    Single,
    /// Several characters in one conversation.
    Multi,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single-participant"),
            Self::Multi => f.write_str("multi-participant"),
        }
    }
}

/// A closed set of placeholder names for one render mode.
pub trait Placeholder: Copy + fmt::Debug + PartialEq {
    /// Mode this placeholder set belongs to.
    const MODE: RenderMode;

    /// Resolve a placeholder name.
    fn parse(name: &str) -> Option<Self>;
}

/// Values for every placeholder of a mode.
pub trait FieldValues<K: Placeholder> {
    /// Text substituted for `key`.
    fn value(&self, key: K) -> &str;
}

// ---------------------------------------------------------------------------
// Single participant
// ---------------------------------------------------------------------------

/// Placeholders available to single-participant templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleField {
    /// `{name}`
    Name,
    /// `{bio}`
    Bio,
    /// `{trust}`
    Trust,
    /// `{location}`
    Location,
    /// `{time}`
    Time,
    /// `{time_group}`
    TimeGroup,
    /// `{language}`
    Language,
    /// `{conversation_summary}`
    ConversationSummary,
}

impl Placeholder for SingleField {
    const MODE: RenderMode = RenderMode::Single;

    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "name" => Self::Name,
            "bio" => Self::Bio,
            "trust" => Self::Trust,
            "location" => Self::Location,
            "time" => Self::Time,
            "time_group" => Self::TimeGroup,
            "language" => Self::Language,
            "conversation_summary" => Self::ConversationSummary,
            _ => return None,
        })
    }
}

/// Values for a single-participant render.
#[derive(Debug, Clone, Copy)]
pub struct SingleParticipantFields<'a> {
    /// Speaking character's name.
    pub name: &'a str,
    /// Speaking character's biography.
    pub bio: &'a str,
    /// Trust phrase toward the player.
    pub trust: &'a str,
    /// Location name.
    pub location: &'a str,
    /// Hour of day.
    pub time: &'a str,
    /// Coarse time label.
    pub time_group: &'a str,
    /// Response language.
    pub language: &'a str,
    /// Framed previous-conversation summary, possibly empty.
    pub conversation_summary: &'a str,
}

impl FieldValues<SingleField> for SingleParticipantFields<'_> {
    fn value(&self, key: SingleField) -> &str {
        match key {
            SingleField::Name => self.name,
            SingleField::Bio => self.bio,
            SingleField::Trust => self.trust,
            SingleField::Location => self.location,
            SingleField::Time => self.time,
            SingleField::TimeGroup => self.time_group,
            SingleField::Language => self.language,
            SingleField::ConversationSummary => self.conversation_summary,
        }
    }
}

// ---------------------------------------------------------------------------
// Multi participant
// ---------------------------------------------------------------------------

/// Placeholders available to multi-participant templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiField {
    /// `{name}`
    Name,
    /// `{names}`
    Names,
    /// `{names_w_player}`
    NamesWithPlayer,
    /// `{language}`
    Language,
    /// `{location}`
    Location,
    /// `{time}`
    Time,
    /// `{time_group}`
    TimeGroup,
    /// `{bios}`
    Bios,
    /// `{conversation_summaries}`
    ConversationSummaries,
}

impl Placeholder for MultiField {
    const MODE: RenderMode = RenderMode::Multi;

    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "name" => Self::Name,
            "names" => Self::Names,
            "names_w_player" => Self::NamesWithPlayer,
            "language" => Self::Language,
            "location" => Self::Location,
            "time" => Self::Time,
            "time_group" => Self::TimeGroup,
            "bios" => Self::Bios,
            "conversation_summaries" => Self::ConversationSummaries,
            _ => return None,
        })
    }
}

/// Values for a multi-participant render.
#[derive(Debug, Clone, Copy)]
pub struct MultiParticipantFields<'a> {
    /// Speaking character's name.
    pub name: &'a str,
    /// Natural list of participant names.
    pub names: &'a str,
    /// Natural list including the player, unless radiant.
    pub names_with_player: &'a str,
    /// Response language.
    pub language: &'a str,
    /// Location name.
    pub location: &'a str,
    /// Hour of day.
    pub time: &'a str,
    /// Coarse time label.
    pub time_group: &'a str,
    /// Biography block or its placeholder.
    pub bios: &'a str,
    /// Memory block or its placeholder.
    pub conversation_summaries: &'a str,
}

impl FieldValues<MultiField> for MultiParticipantFields<'_> {
    fn value(&self, key: MultiField) -> &str {
        match key {
            MultiField::Name => self.name,
            MultiField::Names => self.names,
            MultiField::NamesWithPlayer => self.names_with_player,
            MultiField::Language => self.language,
            MultiField::Location => self.location,
            MultiField::Time => self.time,
            MultiField::TimeGroup => self.time_group,
            MultiField::Bios => self.bios,
            MultiField::ConversationSummaries => self.conversation_summaries,
        }
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Segment<K> {
    Literal(String),
    Field(K),
}

/// A parsed template for one render mode.
#[derive(Debug, Clone)]
pub struct Template<K> {
    source: String,
    segments: Vec<Segment<K>>,
}

/// Template for one character talking with the player.
pub type SingleTemplate = Template<SingleField>;
/// Template for group conversations.
pub type MultiTemplate = Template<MultiField>;

impl<K: Placeholder> Template<K> {
    /// Parse `source`, resolving every placeholder against the mode's set.
    ///
    /// # Errors
    /// Returns [`HearthError::InvalidTemplate`] on unknown placeholders or
    /// unbalanced braces.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let invalid = |reason: String| HearthError::InvalidTemplate {
            mode: K::MODE,
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, n) in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(invalid(format!("unclosed '{{' at byte {pos}")));
                    }
                    let key = K::parse(&name)
                        .ok_or_else(|| invalid(format!("unknown placeholder '{{{name}}}'")))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(key));
                }
                '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid(format!("single '}}' at byte {pos}"))),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { source, segments })
    }

    /// Substitute every placeholder.
    #[must_use]
    pub fn render(&self, fields: &impl FieldValues<K>) -> String {
        let mut out = String::with_capacity(self.source.len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(key) => out.push_str(fields.value(*key)),
            }
        }
        out
    }

    /// Whether the template references `key` at least once.
    #[must_use]
    pub fn uses(&self, key: K) -> bool {
        self.segments.iter().any(|s| *s == Segment::Field(key))
    }

    /// Original template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// Template pair
// ---------------------------------------------------------------------------

/// Default single-participant prompt.
pub const SINGLE_PROMPT: &str = "You are {name} in Skyrim. This is your background: {bio}\n\
Sometimes in-game events will be sent as system messages with the text between * symbols. \
You are having a conversation with {trust} (the player) in {location}. \
It is {time_group}, around {time} o'clock.\n\
This conversation is a script that will be spoken aloud, so please keep your responses \
appropriately concise and avoid text-only formatting such as numbered lists.\n\
The conversation takes place in {language}.\n\n\
{conversation_summary}";

/// Default multi-participant prompt.
pub const MULTI_PROMPT: &str = "The following is a conversation in {location} in Skyrim between {names_w_player}. \
It is {time_group}, around {time} o'clock.\n\
Here are their backgrounds:\n{bios}\n\n\
And here are their conversation histories:\n{conversation_summaries}\n\n\
You are tasked with providing the responses of the characters {names}. \
Start every line with the name of the character speaking, followed by a colon. \
The conversation takes place in {language}.";

#[derive(Debug, Deserialize)]
struct TomlPrompts {
    single: String,
    multi: String,
}

/// The pair of templates an assembler chooses between.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Used when one character is present.
    pub single: SingleTemplate,
    /// Used when several characters are present.
    pub multi: MultiTemplate,
}

impl PromptTemplates {
    /// Parse both templates.
    ///
    /// # Errors
    /// Returns [`HearthError::InvalidTemplate`] if either fails to parse.
    pub fn new(single: &str, multi: &str) -> Result<Self> {
        Ok(Self {
            single: SingleTemplate::parse(single)?,
            multi: MultiTemplate::parse(multi)?,
        })
    }

    /// Built-in templates.
    ///
    /// # Errors
    /// Never in practice; the built-ins are covered by tests.
    pub fn builtin() -> Result<Self> {
        Self::new(SINGLE_PROMPT, MULTI_PROMPT)
    }

    /// Load templates from a TOML string with `single` and `multi` keys.
    ///
    /// # Errors
    /// Returns [`HearthError::Config`] on malformed TOML, or
    /// [`HearthError::InvalidTemplate`] on bad templates.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let prompts: TomlPrompts =
            toml::from_str(toml_str).map_err(|e| HearthError::Config(e.to_string()))?;
        Self::new(&prompts.single, &prompts.multi)
    }

    /// Load templates from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_fields() -> SingleParticipantFields<'static> {
        SingleParticipantFields {
            name: "Lydia",
            bio: "Housecarl of Whiterun.",
            trust: "a friend",
            location: "Dragonsreach",
            time: "9",
            time_group: "in the morning",
            language: "English",
            conversation_summary: "",
        }
    }

    #[test]
    fn renders_placeholders() {
        let tpl = SingleTemplate::parse("I am {name}, talking to {trust} in {location}.")
            .expect("valid template");
        assert_eq!(
            tpl.render(&single_fields()),
            "I am Lydia, talking to a friend in Dragonsreach."
        );
    }

    #[test]
    fn escaped_braces_are_literal() {
        let tpl = SingleTemplate::parse("{{json}} for {name}}}").expect("valid template");
        assert_eq!(tpl.render(&single_fields()), "{json} for Lydia}");
    }

    #[test]
    fn unknown_placeholder_rejected_at_parse() {
        let err = SingleTemplate::parse("Hello {names}").expect_err("names is multi-only");
        assert!(matches!(
            err,
            HearthError::InvalidTemplate {
                mode: RenderMode::Single,
                ..
            }
        ));
        assert!(MultiTemplate::parse("Hello {names}").is_ok());
        assert!(MultiTemplate::parse("Hello {bio}").is_err());
    }

    #[test]
    fn unbalanced_braces_rejected() {
        assert!(SingleTemplate::parse("Hello {name").is_err());
        assert!(SingleTemplate::parse("Hello name}").is_err());
        assert!(SingleTemplate::parse("Hello {}").is_err());
    }

    #[test]
    fn builtin_templates_parse_and_use_memory_blocks() {
        let templates = PromptTemplates::builtin().expect("builtin templates parse");
        assert!(templates.single.uses(SingleField::Trust));
        assert!(templates.single.uses(SingleField::ConversationSummary));
        assert!(templates.multi.uses(MultiField::Bios));
        assert!(templates.multi.uses(MultiField::ConversationSummaries));
        assert!(templates.multi.uses(MultiField::NamesWithPlayer));
    }

    #[test]
    fn loads_from_toml() {
        let templates = PromptTemplates::from_toml(
            "single = \"You are {name}.\"\nmulti = \"You are {names}.\"\n",
        )
        .expect("valid prompts");
        assert_eq!(templates.single.source(), "You are {name}.");

        let bad = PromptTemplates::from_toml("single = \"{oops}\"\nmulti = \"x\"\n");
        assert!(bad.is_err());
    }
}
