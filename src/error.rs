use thiserror::Error;

use crate::model::session::SessionStage;

/// Generic message shown to the player whenever the backend misbehaves.
pub const ENGINE_BUSY_MESSAGE: &str = "Story engine is busy; try again.";

// Session / prompt preconditions. Never fixed by retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("{operation} is not allowed while the session is {actual} (expected {expected})")]
    WrongStage {
        operation: &'static str,
        expected: SessionStage,
        actual: SessionStage,
    },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("prompt is missing its {0}")]
    MissingContext(&'static str),
}

// Failures reported by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation backend unavailable: {0}")]
    Transient(String),

    #[error("generation backend rate limited: {0}")]
    RateLimited(String),

    #[error("generation backend rejected the credentials: {0}")]
    Auth(String),

    #[error("generation backend returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Transient(_) | GenerationError::RateLimited(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("model returned an empty response")]
    Empty,
}

/// Everything [`SessionOrchestrator::handle`](crate::SessionOrchestrator::handle) can fail with.
///
/// On `Generation` and `Parse` the caller still holds the untouched session it
/// passed in, so the same request can simply be sent again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("invalid state: {0}")]
    InvalidState(#[from] StateError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("unusable model output: {0}")]
    Parse(#[from] ParseError),
}

impl OrchestratorError {
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::InvalidState(_) => false,
            OrchestratorError::Generation(e) => !matches!(e, GenerationError::Auth(_)),
            OrchestratorError::Parse(_) => true,
        }
    }

    /// Maps the error to a message fit for the player.
    ///
    /// Backend details only appear when `debug` is set.
    pub fn user_message(&self, debug: bool) -> String {
        let message = match self {
            OrchestratorError::InvalidState(StateError::EmptyField("user action")) => {
                "No action provided.".to_string()
            }
            OrchestratorError::InvalidState(StateError::EmptyField(field)) => {
                format!("Please fill in the {field}.")
            }
            OrchestratorError::InvalidState(_) => {
                "That action is not available at this point of the story.".to_string()
            }
            OrchestratorError::Generation(_) | OrchestratorError::Parse(_) => {
                ENGINE_BUSY_MESSAGE.to_string()
            }
        };

        if debug {
            format!("{message}\n({self})")
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_detail_is_hidden_without_debug() {
        let err = OrchestratorError::from(GenerationError::Auth("bad key sk-123".into()));

        let plain = err.user_message(false);
        assert_eq!(plain, ENGINE_BUSY_MESSAGE);
        assert!(!plain.contains("sk-123"));

        let verbose = err.user_message(true);
        assert!(verbose.starts_with(ENGINE_BUSY_MESSAGE));
        assert!(verbose.contains("sk-123"));
    }

    #[test]
    fn blank_action_gets_a_specific_message() {
        let err = OrchestratorError::from(StateError::EmptyField("user action"));
        assert_eq!(err.user_message(false), "No action provided.");
        assert!(!err.is_retryable());
    }

    #[test]
    fn retryability_follows_the_taxonomy() {
        assert!(OrchestratorError::from(ParseError::Empty).is_retryable());
        assert!(OrchestratorError::from(GenerationError::Transient("down".into())).is_retryable());
        assert!(!OrchestratorError::from(GenerationError::Auth("401".into())).is_retryable());
        assert!(GenerationError::RateLimited("429".into()).is_transient());
        assert!(!GenerationError::MalformedResponse("{}".into()).is_transient());
    }
}
