use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::model::character::{Character, CharacterEdit};
use crate::model::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStage {
    AwaitingTheme,
    AwaitingCharacterConfirm,
    AwaitingOpening,
    InProgress,
    Ended,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStage::AwaitingTheme => "awaiting a theme",
            SessionStage::AwaitingCharacterConfirm => "awaiting character confirmation",
            SessionStage::AwaitingOpening => "awaiting the opening",
            SessionStage::InProgress => "in progress",
            SessionStage::Ended => "ended",
        };
        f.write_str(label)
    }
}

/// The generation-backed steps of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoryStep {
    SuggestCharacter,
    Opening,
    Continue,
}

impl StoryStep {
    pub fn expected_stage(self) -> SessionStage {
        match self {
            StoryStep::SuggestCharacter => SessionStage::AwaitingCharacterConfirm,
            StoryStep::Opening => SessionStage::AwaitingOpening,
            StoryStep::Continue => SessionStage::InProgress,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StoryStep::SuggestCharacter => "suggest_character",
            StoryStep::Opening => "start_story",
            StoryStep::Continue => "continue_story",
        }
    }
}

/// One story, from theme selection to the end.
///
/// A session is a value: every transition borrows the current session and
/// returns a new one, so a failed step leaves the caller's copy as it was.
/// The narrative only ever grows; theme and character are frozen once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySession {
    theme: Option<Theme>,
    suggestion: Option<Character>,
    character: Option<Character>,
    narrative: Vec<String>,
    stage: SessionStage,
}

impl Default for StorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl StorySession {
    pub fn new() -> Self {
        Self {
            theme: None,
            suggestion: None,
            character: None,
            narrative: Vec::new(),
            stage: SessionStage::AwaitingTheme,
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    pub fn suggestion(&self) -> Option<&Character> {
        self.suggestion.as_ref()
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn narrative(&self) -> &[String] {
        &self.narrative
    }

    pub fn story_so_far(&self) -> String {
        self.narrative.join("\n\n")
    }

    pub fn is_ended(&self) -> bool {
        self.stage == SessionStage::Ended
    }

    pub fn select_theme(&self, theme: Theme) -> Result<Self, StateError> {
        self.expect_stage("select_theme", SessionStage::AwaitingTheme)?;

        if theme.label().is_empty() {
            return Err(StateError::EmptyField("theme"));
        }

        Ok(Self {
            theme: Some(theme),
            stage: SessionStage::AwaitingCharacterConfirm,
            ..self.clone()
        })
    }

    /// Stores the latest suggested protagonist. Suggesting again replaces it.
    pub fn record_suggestion(&self, character: Character) -> Result<Self, StateError> {
        self.expect_stage("record_suggestion", SessionStage::AwaitingCharacterConfirm)?;
        require_character(&character)?;

        Ok(Self {
            suggestion: Some(character),
            ..self.clone()
        })
    }

    pub fn confirm_character(&self, character: Character) -> Result<Self, StateError> {
        self.expect_stage("confirm_character", SessionStage::AwaitingCharacterConfirm)?;
        require_character(&character)?;

        Ok(Self {
            character: Some(Character::new(
                character.name.trim(),
                character.personality.trim(),
            )),
            stage: SessionStage::AwaitingOpening,
            ..self.clone()
        })
    }

    /// Confirms the suggestion with the player's edits layered on top.
    pub fn confirm_edit(&self, edit: CharacterEdit) -> Result<Self, StateError> {
        let merged = edit.merge_onto(self.suggestion.as_ref());
        self.confirm_character(merged)
    }

    pub fn apply_opening(&self, text: &str) -> Result<Self, StateError> {
        self.expect_stage("apply_opening", SessionStage::AwaitingOpening)?;
        let text = non_empty(text, "opening text")?;

        Ok(self.appended(text, SessionStage::InProgress))
    }

    pub fn apply_action(&self, user_action: &str, result_text: &str) -> Result<Self, StateError> {
        self.expect_stage("apply_action", SessionStage::InProgress)?;
        non_empty(user_action, "user action")?;
        let text = non_empty(result_text, "narrative text")?;

        Ok(self.appended(text, SessionStage::InProgress))
    }

    pub fn end(&self) -> Self {
        Self {
            stage: SessionStage::Ended,
            ..self.clone()
        }
    }

    pub(crate) fn expect_stage(
        &self,
        operation: &'static str,
        expected: SessionStage,
    ) -> Result<(), StateError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(StateError::WrongStage {
                operation,
                expected,
                actual: self.stage,
            })
        }
    }

    fn appended(&self, segment: &str, stage: SessionStage) -> Self {
        let mut narrative = self.narrative.clone();
        narrative.push(segment.to_string());

        Self {
            narrative,
            stage,
            ..self.clone()
        }
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, StateError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StateError::EmptyField(field))
    } else {
        Ok(trimmed)
    }
}

fn require_character(character: &Character) -> Result<(), StateError> {
    non_empty(&character.name, "character name")?;
    non_empty(&character.personality, "character personality")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_progress() -> StorySession {
        StorySession::new()
            .select_theme(Theme::Mystery)
            .and_then(|s| s.confirm_character(Character::new("Ada Finch", "A sharp-eyed clerk.")))
            .and_then(|s| s.apply_opening("Fog over the harbour."))
            .expect("valid path")
    }

    #[test]
    fn happy_path_walks_every_stage_in_order() {
        let session = StorySession::new();
        assert_eq!(session.stage(), SessionStage::AwaitingTheme);

        let session = session.select_theme(Theme::Fantasy).unwrap();
        assert_eq!(session.stage(), SessionStage::AwaitingCharacterConfirm);

        let session = session
            .confirm_character(Character::new("Bran", "Loyal to a fault."))
            .unwrap();
        assert_eq!(session.stage(), SessionStage::AwaitingOpening);

        let session = session.apply_opening("The village sleeps.").unwrap();
        assert_eq!(session.stage(), SessionStage::InProgress);
        assert_eq!(session.narrative().len(), 1);

        let session = session.end();
        assert!(session.is_ended());
    }

    #[test]
    fn calls_from_the_wrong_stage_are_rejected() {
        let fresh = StorySession::new();

        let err = fresh.apply_action("run", "You run.").unwrap_err();
        assert_eq!(
            err,
            StateError::WrongStage {
                operation: "apply_action",
                expected: SessionStage::InProgress,
                actual: SessionStage::AwaitingTheme,
            }
        );

        assert!(fresh.apply_opening("text").is_err());
        assert!(fresh
            .confirm_character(Character::new("a", "b"))
            .is_err());

        let themed = fresh.select_theme(Theme::Adventure).unwrap();
        assert!(themed.select_theme(Theme::Fantasy).is_err());
    }

    #[test]
    fn every_transition_rejects_every_other_stage() {
        let themed = StorySession::new().select_theme(Theme::Fantasy).unwrap();
        let awaiting_opening = themed
            .confirm_character(Character::new("Bran", "Loyal."))
            .unwrap();
        let sessions = [
            StorySession::new(),
            themed,
            awaiting_opening,
            in_progress(),
            in_progress().end(),
        ];

        type Transition = fn(&StorySession) -> Result<StorySession, StateError>;
        let transitions: [(&'static str, SessionStage, Transition); 5] = [
            ("select_theme", SessionStage::AwaitingTheme, |s| {
                s.select_theme(Theme::Mystery)
            }),
            ("record_suggestion", SessionStage::AwaitingCharacterConfirm, |s| {
                s.record_suggestion(Character::new("Lyra", "Bold."))
            }),
            ("confirm_character", SessionStage::AwaitingCharacterConfirm, |s| {
                s.confirm_character(Character::new("Lyra", "Bold."))
            }),
            ("apply_opening", SessionStage::AwaitingOpening, |s| {
                s.apply_opening("It begins.")
            }),
            ("apply_action", SessionStage::InProgress, |s| {
                s.apply_action("wait", "Time passes.")
            }),
        ];

        for session in &sessions {
            for (operation, expected, transition) in transitions {
                let result = transition(session);
                if session.stage() == expected {
                    assert!(result.is_ok(), "{operation} from {}", session.stage());
                } else {
                    assert_eq!(
                        result,
                        Err(StateError::WrongStage {
                            operation,
                            expected,
                            actual: session.stage(),
                        })
                    );
                }
            }
        }
    }

    #[test]
    fn character_cannot_be_changed_after_confirmation() {
        let session = StorySession::new()
            .select_theme(Theme::Fantasy)
            .unwrap()
            .confirm_character(Character::new("Bran", "Loyal."))
            .unwrap();

        assert!(session
            .confirm_character(Character::new("Other", "Different."))
            .is_err());
        assert_eq!(session.character().unwrap().name, "Bran");
    }

    #[test]
    fn confirm_requires_both_fields() {
        let session = StorySession::new().select_theme(Theme::Fantasy).unwrap();

        assert_eq!(
            session.confirm_character(Character::new(" ", "Loyal.")),
            Err(StateError::EmptyField("character name"))
        );
        assert_eq!(
            session.confirm_character(Character::new("Bran", "")),
            Err(StateError::EmptyField("character personality"))
        );
    }

    #[test]
    fn confirm_edit_merges_over_the_suggestion() {
        let session = StorySession::new()
            .select_theme(Theme::Fantasy)
            .unwrap()
            .record_suggestion(Character::new("Lyra", "Curious and bold."))
            .unwrap()
            .confirm_edit(CharacterEdit {
                name: None,
                personality: Some("Cautious healer.".into()),
            })
            .unwrap();

        assert_eq!(
            session.character(),
            Some(&Character::new("Lyra", "Cautious healer."))
        );
    }

    #[test]
    fn custom_theme_needs_a_label() {
        let err = StorySession::new()
            .select_theme(Theme::Custom("   ".into()))
            .unwrap_err();
        assert_eq!(err, StateError::EmptyField("theme"));
    }

    #[test]
    fn narrative_is_append_only() {
        let opened = in_progress();
        let once = opened.apply_action("open the door", "It creaks.").unwrap();
        let twice = once.apply_action("look inside", "Dust everywhere.").unwrap();

        assert_eq!(opened.narrative().len(), 1);
        assert_eq!(twice.narrative().len(), 3);
        assert_eq!(twice.narrative()[..2], once.narrative()[..]);
        assert_eq!(twice.narrative()[2], "Dust everywhere.");
        assert_eq!(
            twice.story_so_far(),
            "Fog over the harbour.\n\nIt creaks.\n\nDust everywhere."
        );
    }

    #[test]
    fn blank_action_is_rejected() {
        let session = in_progress();
        assert_eq!(
            session.apply_action("  ", "text"),
            Err(StateError::EmptyField("user action"))
        );
        assert_eq!(
            session.apply_action("wait", "\n"),
            Err(StateError::EmptyField("narrative text"))
        );
    }

    #[test]
    fn end_is_terminal_and_idempotent() {
        let ended = in_progress().end();
        assert_eq!(ended.end(), ended);
        assert!(ended.apply_action("jump", "You jump.").is_err());
        assert_eq!(ended.narrative().len(), 1);

        assert!(StorySession::new().end().is_ended());
    }
}
