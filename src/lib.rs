//! Story Weaver: an interactive storytelling engine backed by a generative text model.
//!
//! The core lives in [`model`] (the story session state machine) and [`engine`]
//! (prompt building, response parsing and orchestration). [`config`] and [`ui`]
//! are the thin collaborators that wire it into a desktop app.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod ui;

pub use engine::llm_client::GenerationClient;
pub use engine::orchestrator::{Outcome, RetryPolicy, SessionOrchestrator};
pub use error::{GenerationError, OrchestratorError, ParseError, StateError};
pub use model::character::{Character, CharacterEdit};
pub use model::session::{SessionStage, StoryStep, StorySession};
pub use model::theme::Theme;
