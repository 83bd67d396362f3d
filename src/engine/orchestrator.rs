use std::thread;
use std::time::Duration;

use crate::engine::llm_client::GenerationClient;
use crate::engine::narrative_parser::{parse_character, parse_narrative};
use crate::engine::prompt_builder::{PromptBuilder, PromptContext};
use crate::error::{GenerationError, OrchestratorError, StateError};
use crate::model::session::{StoryStep, StorySession};

/// How often a rate-limited request is tried again, and how long to wait first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub wait: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Result of one successful step: the replacement session and the text to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub session: StorySession,
    pub output: String,
}

/// Drives one story step: check stage, build prompt, call the backend,
/// parse the reply, apply the transition.
///
/// The orchestrator never touches the session it is handed. Any failure
/// returns before a new session is built, so the caller's copy is the state
/// to retry from.
pub struct SessionOrchestrator<C> {
    client: C,
    retry: RetryPolicy,
}

impl<C: GenerationClient> SessionOrchestrator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn handle(
        &self,
        session: &StorySession,
        step: StoryStep,
        user_input: &str,
    ) -> Result<Outcome, OrchestratorError> {
        session.expect_stage(step.name(), step.expected_stage())?;

        if step == StoryStep::Continue && user_input.trim().is_empty() {
            return Err(StateError::EmptyField("user action").into());
        }

        let story_so_far = session.story_so_far();
        let context = PromptContext::from_session(session, &story_so_far, user_input);
        let prompt = PromptBuilder::build(step, &context)?;

        let raw = self.submit(&prompt)?;

        let outcome = match step {
            StoryStep::SuggestCharacter => {
                let character = parse_character(&raw)?;
                let output = format!("{}: {}", character.name, character.personality);
                Outcome {
                    session: session.record_suggestion(character)?,
                    output,
                }
            }
            StoryStep::Opening => {
                let text = parse_narrative(&raw)?;
                Outcome {
                    session: session.apply_opening(&text)?,
                    output: text,
                }
            }
            StoryStep::Continue => {
                let text = parse_narrative(&raw)?;
                Outcome {
                    session: session.apply_action(user_input, &text)?,
                    output: text,
                }
            }
        };

        Ok(outcome)
    }

    pub fn suggest_character(&self, session: &StorySession) -> Result<Outcome, OrchestratorError> {
        self.handle(session, StoryStep::SuggestCharacter, "")
    }

    pub fn start_story(&self, session: &StorySession) -> Result<Outcome, OrchestratorError> {
        self.handle(session, StoryStep::Opening, "")
    }

    pub fn continue_story(
        &self,
        session: &StorySession,
        user_action: &str,
    ) -> Result<Outcome, OrchestratorError> {
        self.handle(session, StoryStep::Continue, user_action)
    }

    fn submit(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut remaining = self.retry.attempts;

        loop {
            match self.client.submit(prompt) {
                Err(GenerationError::RateLimited(_)) if remaining > 0 => {
                    remaining -= 1;
                    thread::sleep(self.retry.wait);
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::model::character::Character;
    use crate::model::session::SessionStage;
    use crate::model::theme::Theme;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        replies: RefCell<VecDeque<Result<String, GenerationError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn replying(replies: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                prompts: RefCell::default(),
            }
        }
    }

    impl GenerationClient for Scripted {
        fn submit(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Transient("script exhausted".into())))
        }
    }

    fn themed() -> StorySession {
        StorySession::new().select_theme(Theme::Fantasy).unwrap()
    }

    #[test]
    fn suggestion_is_recorded_without_advancing() {
        let orchestrator = SessionOrchestrator::new(Scripted::replying(vec![Ok(
            r#"{"name": "Wren", "personality": "Quick and kind."}"#.into(),
        )]));

        let outcome = orchestrator.suggest_character(&themed()).unwrap();

        assert_eq!(outcome.output, "Wren: Quick and kind.");
        assert_eq!(outcome.session.stage(), SessionStage::AwaitingCharacterConfirm);
        assert_eq!(
            outcome.session.suggestion(),
            Some(&Character::new("Wren", "Quick and kind."))
        );
    }

    #[test]
    fn stage_mismatch_never_reaches_the_backend() {
        let orchestrator = SessionOrchestrator::new(Scripted::default());

        let err = orchestrator.start_story(&themed()).unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::InvalidState(StateError::WrongStage { .. })
        ));
        assert!(orchestrator.client().prompts.borrow().is_empty());
    }

    #[test]
    fn blank_action_is_rejected_before_generation() {
        let session = themed()
            .confirm_character(Character::new("Wren", "Quick."))
            .and_then(|s| s.apply_opening("Morning."))
            .unwrap();
        let orchestrator = SessionOrchestrator::new(Scripted::default());

        assert_eq!(
            orchestrator.continue_story(&session, "   "),
            Err(OrchestratorError::InvalidState(StateError::EmptyField("user action")))
        );
        assert!(orchestrator.client().prompts.borrow().is_empty());
    }

    #[test]
    fn empty_reply_is_a_parse_error() {
        let session = themed()
            .confirm_character(Character::new("Wren", "Quick."))
            .unwrap();
        let orchestrator = SessionOrchestrator::new(Scripted::replying(vec![Ok("  \n".into())]));

        assert_eq!(
            orchestrator.start_story(&session),
            Err(OrchestratorError::Parse(ParseError::Empty))
        );
    }

    #[test]
    fn rate_limits_are_retried_when_allowed() {
        let orchestrator = SessionOrchestrator::new(Scripted::replying(vec![
            Err(GenerationError::RateLimited("429".into())),
            Ok("Aria: brave".into()),
        ]))
        .with_retry(RetryPolicy {
            attempts: 1,
            wait: Duration::ZERO,
        });

        let outcome = orchestrator.suggest_character(&themed()).unwrap();

        assert_eq!(orchestrator.client().prompts.borrow().len(), 2);
        assert_eq!(outcome.session.suggestion().unwrap().personality, "Aria: brave");
    }

    #[test]
    fn other_failures_are_not_retried() {
        let orchestrator = SessionOrchestrator::new(Scripted::replying(vec![
            Err(GenerationError::Auth("401".into())),
            Ok("unused".into()),
        ]))
        .with_retry(RetryPolicy {
            attempts: 3,
            wait: Duration::ZERO,
        });

        assert_eq!(
            orchestrator.suggest_character(&themed()),
            Err(OrchestratorError::Generation(GenerationError::Auth("401".into())))
        );
        assert_eq!(orchestrator.client().prompts.borrow().len(), 1);
    }

    #[test]
    fn without_a_policy_rate_limits_surface_immediately() {
        let orchestrator = SessionOrchestrator::new(Scripted::replying(vec![
            Err(GenerationError::RateLimited("429".into())),
            Ok("unused".into()),
        ]));

        assert!(matches!(
            orchestrator.suggest_character(&themed()),
            Err(OrchestratorError::Generation(GenerationError::RateLimited(_)))
        ));
        assert_eq!(orchestrator.client().prompts.borrow().len(), 1);
    }
}
