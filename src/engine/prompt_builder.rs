use crate::error::StateError;
use crate::model::character::Character;
use crate::model::session::{StoryStep, StorySession};
use crate::model::theme::Theme;

/// Everything a prompt may draw on. Rebuilt for every request, never stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptContext<'a> {
    pub theme: Option<&'a Theme>,
    pub character: Option<&'a Character>,
    pub story_so_far: Option<&'a str>,
    pub user_action: Option<&'a str>,
}

impl<'a> PromptContext<'a> {
    pub fn from_session(session: &'a StorySession, story_so_far: &'a str, user_action: &'a str) -> Self {
        Self {
            theme: session.theme(),
            character: session.character(),
            story_so_far: Some(story_so_far),
            user_action: Some(user_action),
        }
    }
}

/// Builds the full prompt sent to the generation backend.
/// Only formats text: no parsing, no networking, no randomness.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(step: StoryStep, context: &PromptContext<'_>) -> Result<String, StateError> {
        let theme = context.theme.ok_or(StateError::MissingContext("theme"))?;

        match step {
            StoryStep::SuggestCharacter => Ok(Self::suggest_character(theme)),
            StoryStep::Opening => {
                let character = context
                    .character
                    .ok_or(StateError::MissingContext("character"))?;
                Ok(Self::opening(theme, character))
            }
            StoryStep::Continue => {
                let character = context
                    .character
                    .ok_or(StateError::MissingContext("character"))?;
                let story_so_far = present(context.story_so_far, "story so far")?;
                let user_action = present(context.user_action, "user action")?;
                Ok(Self::continuation(theme, character, story_so_far, user_action))
            }
        }
    }

    pub fn suggest_character(theme: &Theme) -> String {
        let mut prompt = String::new();

        push_engine_preamble(&mut prompt, theme, None);
        prompt.push_str(&format!(
            "Given genre: {theme}. Suggest a single protagonist: \
             full name and one sentence personality. \
             Reply only with valid JSON: {{\"name\": \"...\", \"personality\": \"...\"}}."
        ));

        prompt
    }

    pub fn opening(theme: &Theme, character: &Character) -> String {
        let mut prompt = String::new();

        push_engine_preamble(&mut prompt, theme, None);
        push_character_line(&mut prompt, character);
        prompt.push_str(
            "Write exactly 2 short paragraphs: (1) a tranquil setting where the character is. \
             (2) A sudden disruption (event or danger). \
             No dialogue from the narrator; set the scene only.",
        );

        prompt
    }

    pub fn continuation(
        theme: &Theme,
        character: &Character,
        story_so_far: &str,
        user_action: &str,
    ) -> String {
        let mut prompt = String::new();

        let hint = format!(
            "Character: {}. Personality: {}. Stay in genre.",
            character.name.trim(),
            character.personality.trim()
        );
        push_engine_preamble(&mut prompt, theme, Some(&hint));

        prompt.push_str("Story so far:\n");
        prompt.push_str(story_so_far.trim());
        prompt.push_str("\n\n");

        prompt.push_str("Player action: ");
        prompt.push_str(user_action.trim());
        prompt.push_str("\n\n");

        prompt.push_str(
            "Write the next narrative segment (2-4 sentences) that results from this action. \
             Then briefly describe the new situation so the player can choose another action.",
        );

        prompt
    }
}

fn present<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, StateError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StateError::MissingContext(field)),
    }
}

fn push_engine_preamble(prompt: &mut String, theme: &Theme, hint: Option<&str>) {
    prompt.push_str("You are a narrative engine for an interactive story. Genre: ");
    prompt.push_str(theme.label());
    prompt.push('.');

    if let Some(hint) = hint {
        prompt.push(' ');
        prompt.push_str(hint);
    }

    prompt.push_str("\n\n");
}

fn push_character_line(prompt: &mut String, character: &Character) {
    prompt.push_str(&format!(
        "Character: {}. Personality: {}. ",
        character.name.trim(),
        character.personality.trim()
    ));
}
