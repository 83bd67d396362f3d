use crate::model::character::CharacterEdit;
use crate::model::message::Message;
use crate::model::session::StorySession;
use crate::model::theme::Theme;

pub enum EngineCommand {
    /// Starts a story in the given genre and asks for a protagonist.
    SelectTheme(Theme),
    SuggestCharacter,
    ConfirmCharacter(CharacterEdit),
    StartStory,
    Continue(String),
    EndStory,
    NewStory,
    SetDebug(bool),
    TestConnection,
}

#[derive(Debug)]
pub enum EngineResponse {
    Updated {
        session: StorySession,
        messages: Vec<Message>,
    },

    /// The step failed; `session` is the engine's current (unchanged) session.
    Failed {
        session: StorySession,
        message: String,
    },

    ConnectionStatus(String),
}
