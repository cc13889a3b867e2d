//! Integration Tests — full session cycles against the file store.

use std::collections::VecDeque;
use std::future::{Future, ready};

use parking_lot::Mutex;

use hearth_core::assembler::{DegradationTier, PromptAssembler, TokenBudget};
use hearth_core::config::{HearthConfig, RetryConfig};
use hearth_core::message::ChatMessage;
use hearth_core::template::PromptTemplates;
use hearth_core::token::HeuristicCounter;
use hearth_core::types::Participant;
use hearth_llm::{LanguageModel, LlmError, LlmRequest, LlmResponse, Summarizer};
use hearth_npc::session::scene_from_game;
use hearth_npc::{Character, CharacterInfo, ConversationStore, InMemoryStore, JsonFileStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ScriptedModel {
    replies: Mutex<VecDeque<&'static str>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedModel {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(
        &self,
        request: &LlmRequest,
    ) -> impl Future<Output = Result<LlmResponse, LlmError>> + Send {
        self.requests.lock().push(request.clone());
        let reply = self
            .replies
            .lock()
            .pop_front()
            .map(LlmResponse::text)
            .ok_or_else(|| LlmError::Unavailable("script exhausted".into()));
        ready(reply)
    }
}

fn lydia(generic: bool) -> Character {
    let info = CharacterInfo::from_json(
        r#"{
            "name": "Lydia",
            "bio": "Housecarl of Whiterun, sworn to carry your burdens.",
            "in_game_relationship_level": 0,
            "is_in_combat": "False",
            "pc_has_weapon_drawn": "False",
            "has_weapon_draw": "False",
            "have_common_enemy_nearby": "False",
            "in_game_voice_model": "FemaleEvenToned",
            "voice_model": "FemaleEvenToned"
        }"#,
    )
    .expect("valid payload");
    Character::new(info, "English", generic).expect("valid character")
}

fn conversation(system_prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user("Hello."),
        ChatMessage::assistant("My Thane."),
        ChatMessage::user("*gives Lydia a steel sword* Keep this safe."),
        ChatMessage::assistant("I will guard it with my life."),
        ChatMessage::user("Goodbye."),
        ChatMessage::assistant("Safe travels, my Thane."),
    ]
}

fn retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 1,
        ..RetryConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_meeting_then_remembered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    let config = HearthConfig::default();
    let templates = PromptTemplates::builtin().expect("builtin templates");
    let assembler = PromptAssembler::new(HeuristicCounter, config.context.budget());
    let scene = scene_from_game(Some("Dragonsreach"), Some("9.5"), false, &config.context)
        .expect("scene");
    let summarizer = Summarizer::new(
        ScriptedModel::new(&["The user gave the assistant a steel sword to keep safe."]),
        retry(),
    );

    let mut character = lydia(false);
    let context = character
        .set_context(&store, &templates, &assembler, &[], &scene)
        .expect("first context");
    let prompt = context.system_prompt().to_string();
    assert!(prompt.contains("a suspicious stranger (the player) in Dragonsreach"));
    assert!(prompt.contains("It is in the morning, around 9.5 o'clock"));
    assert!(!prompt.contains("Below is a summary"));
    assert!(character.affect.angry > 0.0);

    let summary = character
        .save_conversation(
            &store,
            &summarizer,
            &HeuristicCounter,
            &conversation(&prompt),
            config.context.token_limit,
            config.summary.summary_limit_pct,
            None,
        )
        .await
        .expect("saved")
        .expect("named NPCs are saved");
    assert_eq!(summary, "The player gave Lydia a steel sword to keep safe.\n\n");

    let history = store.load_history("Lydia").expect("load").expect("exists");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].len(), 6);
    assert_eq!(history[0][0], ChatMessage::user("Hello."));
    assert!(dir.path().join("Lydia/Lydia_summary_1.txt").exists());

    // Six stored turns: trust moves from stranger to acquaintance.
    let context = character
        .set_context(&store, &templates, &assembler, &[], &scene)
        .expect("second context");
    let prompt = context.system_prompt();
    assert!(prompt.contains("an acquaintance (the player)"));
    assert!(prompt.contains("Below is a summary for each of your previous conversations:\n\nThe player gave Lydia a steel sword"));
    assert_eq!(character.conversation_summary, summary);
}

#[tokio::test]
async fn generic_npcs_are_never_saved() {
    let store = InMemoryStore::new();
    let summarizer = Summarizer::new(ScriptedModel::new(&["unused"]), retry());
    let character = lydia(true);

    let saved = character
        .save_conversation(
            &store,
            &summarizer,
            &HeuristicCounter,
            &conversation("context"),
            4096,
            0.45,
            None,
        )
        .await
        .expect("no error");

    assert!(saved.is_none());
    assert!(store.load_history("Lydia").expect("load").is_none());
    assert_eq!(summarizer.model().calls(), 0);
}

#[tokio::test]
async fn shared_summary_skips_the_model() {
    let store = InMemoryStore::new();
    let summarizer = Summarizer::new(ScriptedModel::new(&[]), retry());
    let character = lydia(false);

    let saved = character
        .save_conversation(
            &store,
            &summarizer,
            &HeuristicCounter,
            &conversation("context"),
            4096,
            0.45,
            Some("Lydia and Faendal argued about archery.\n\n".into()),
        )
        .await
        .expect("saved");

    assert_eq!(saved.as_deref(), Some("Lydia and Faendal argued about archery.\n\n"));
    assert_eq!(summarizer.model().calls(), 0);
    assert_eq!(
        store.latest_summary("Lydia").expect("summary"),
        "Lydia and Faendal argued about archery.\n\n"
    );
}

#[tokio::test]
async fn summary_log_rotates_when_over_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path());
    let summarizer = Summarizer::new(
        ScriptedModel::new(&[
            "Lydia received a steel sword.",
            "Lydia promised to guard the house in Breezehome.",
            "Lydia serves the player loyally, guarding both sword and house.",
        ]),
        retry(),
    );
    let character = lydia(false);

    character
        .save_conversation(&store, &summarizer, &HeuristicCounter, &conversation("ctx"), 4096, 0.45, None)
        .await
        .expect("first save");
    assert_eq!(store.latest_summary_number("Lydia").expect("number"), 1);

    // round(20 * 0.45) = 9 tokens: the two summaries no longer fit.
    character
        .save_conversation(&store, &summarizer, &HeuristicCounter, &conversation("ctx"), 20, 0.45, None)
        .await
        .expect("second save");

    assert_eq!(store.latest_summary_number("Lydia").expect("number"), 2);
    let first_log = std::fs::read_to_string(dir.path().join("Lydia/Lydia_summary_1.txt")).expect("log 1");
    assert_eq!(
        first_log,
        "Lydia received a steel sword.\n\nLydia promised to guard the house in Breezehome.\n\n"
    );
    assert_eq!(
        store.latest_summary("Lydia").expect("log 2"),
        "Lydia serves the player loyally, guarding both sword and house.\n\n"
    );

    let requests = summarizer.model().requests.lock();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].user, first_log);
    assert_eq!(store.load_history("Lydia").expect("load").expect("exists").len(), 2);
}

#[tokio::test]
async fn summarization_failure_surfaces_after_saving_history() {
    let store = InMemoryStore::new();
    let summarizer = Summarizer::new(ScriptedModel::new(&[]), retry());
    let character = lydia(false);

    let err = character
        .save_conversation(&store, &summarizer, &HeuristicCounter, &conversation("ctx"), 4096, 0.45, None)
        .await
        .expect_err("model unavailable");

    assert!(matches!(err, hearth_npc::NpcError::Summary(_)));
    assert!(store.load_history("Lydia").expect("load").is_some());
    assert_eq!(store.latest_summary("Lydia").expect("summary"), "");
}

#[test]
fn group_context_includes_companions() {
    let store = InMemoryStore::new();
    let config = HearthConfig::default();
    let templates = PromptTemplates::builtin().expect("builtin templates");
    let scene = scene_from_game(None, None, false, &config.context).expect("scene");
    let companions = [Participant::new("Faendal", "A wood elf archer.")
        .with_summary("Faendal taught the player archery.\n\n")];

    let mut character = lydia(false);
    let roomy = PromptAssembler::new(HeuristicCounter, config.context.budget());
    let context = character
        .set_context(&store, &templates, &roomy, &companions, &scene)
        .expect("group context");
    assert_eq!(context.tier, DegradationTier::Full);
    let prompt = context.system_prompt();
    assert!(prompt.contains("between the player, Lydia and Faendal"));
    assert!(prompt.contains("Faendal: Faendal taught the player archery."));

    let starved = PromptAssembler::new(HeuristicCounter, TokenBudget {
        token_limit: 16,
        prompt_fraction: 0.5,
    });
    let context = character
        .set_context(&store, &templates, &starved, &companions, &scene)
        .expect("degraded context");
    assert_eq!(context.tier, DegradationTier::MemoriesAndBiosElided);
}
