//! Summary prompts and the wording fixes applied to model output.

/// Instruction for summarizing a single conversation.
pub const SUMMARY_PROMPT: &str = "You are tasked with summarizing the conversation between {name} (the assistant) and the player (the user) / other characters. These conversations take place in Skyrim. It is not necessary to comment on any mixups in communication such as mishearings. Text contained within asterisks state in-game events. Please summarize the conversation into a single paragraph in {language}.";

/// Instruction for condensing an accumulated summary log.
pub const CONDENSE_PROMPT: &str = "You are tasked with summarizing the conversation history between {name} (the assistant) and the player (the user) / other characters. These conversations take place in Skyrim. Each paragraph represents a conversation at a new point in time. Please summarize these conversations into a single paragraph in {language}.";

/// Replace `{key}` placeholders in an instruction prompt.
///
/// Unknown placeholders are left as-is.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// The single-conversation instruction for `name`, answering in `language`.
#[must_use]
pub fn summary_prompt(name: &str, language: &str) -> String {
    render_template(SUMMARY_PROMPT, &[("name", name), ("language", language)])
}

/// The log-condensing instruction for `name`, answering in `language`.
#[must_use]
pub fn condense_prompt(name: &str, language: &str) -> String {
    render_template(CONDENSE_PROMPT, &[("name", name), ("language", language)])
}

/// Rewrite chat-assistant vocabulary into in-world terms and terminate the
/// paragraph so summaries can be concatenated.
#[must_use]
pub fn into_world_terms(summary: &str, name: &str) -> String {
    let mut text = summary
        .replace("The assistant", name)
        .replace("the assistant", name)
        .replace("an assistant", name)
        .replace("an AI assistant", name)
        .replace("The user", "The player")
        .replace("the user", "the player");
    text.push_str("\n\n");
    text
}
