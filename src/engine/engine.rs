use std::sync::mpsc::{Receiver, Sender};

use tracing::{error, info};

use crate::engine::llm_client::GenerationClient;
use crate::engine::orchestrator::{Outcome, SessionOrchestrator};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::error::OrchestratorError;
use crate::model::message::Message;
use crate::model::session::{StoryStep, StorySession};

/// Owns the player's session on the worker thread and runs one command at a time.
pub struct Engine<C> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    orchestrator: SessionOrchestrator<C>,
    session: StorySession,
    messages: Vec<Message>,
    debug: bool,
}

impl<C: GenerationClient> Engine<C> {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        orchestrator: SessionOrchestrator<C>,
        debug: bool,
    ) -> Self {
        Self {
            rx,
            tx,
            orchestrator,
            session: StorySession::new(),
            messages: Vec::new(),
            debug,
        }
    }

    pub fn session(&self) -> &StorySession {
        &self.session
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            let response = self.handle(cmd);
            if self.tx.send(response).is_err() {
                break;
            }
        }
        info!("engine stopped");
    }

    pub fn handle(&mut self, cmd: EngineCommand) -> EngineResponse {
        match cmd {
            EngineCommand::SelectTheme(theme) => {
                info!(theme = %theme, "select_theme");
                match StorySession::new().select_theme(theme) {
                    Ok(session) => {
                        self.session = session;
                        self.messages.clear();
                        self.step(StoryStep::SuggestCharacter, "")
                    }
                    Err(e) => self.fail("select_theme", e.into()),
                }
            }

            EngineCommand::SuggestCharacter => self.step(StoryStep::SuggestCharacter, ""),

            EngineCommand::ConfirmCharacter(edit) => match self.session.confirm_edit(edit) {
                Ok(session) => {
                    if let Some(character) = session.character() {
                        info!(character = %character.name, "confirm_character");
                        self.messages.push(Message::System(format!(
                            "{} steps into the story.",
                            character.name
                        )));
                    }
                    self.session = session;
                    self.updated()
                }
                Err(e) => self.fail("confirm_character", e.into()),
            },

            EngineCommand::StartStory => self.step(StoryStep::Opening, ""),

            EngineCommand::Continue(action) => self.step(StoryStep::Continue, &action),

            EngineCommand::EndStory => {
                info!(segments = self.session.narrative().len(), "end_story");
                if !self.session.is_ended() {
                    self.messages.push(Message::System("The End.".into()));
                }
                self.session = self.session.end();
                self.updated()
            }

            EngineCommand::NewStory => {
                self.session = StorySession::new();
                self.messages.clear();
                self.updated()
            }

            EngineCommand::SetDebug(debug) => {
                self.debug = debug;
                self.updated()
            }

            EngineCommand::TestConnection => {
                let status = match self.orchestrator.client().test_connection() {
                    Ok(status) => status,
                    Err(e) => {
                        error!(error = %e, "connection test failed");
                        OrchestratorError::from(e).user_message(self.debug)
                    }
                };
                EngineResponse::ConnectionStatus(status)
            }
        }
    }

    fn step(&mut self, step: StoryStep, input: &str) -> EngineResponse {
        let theme = self.session.theme().map(|t| t.label()).unwrap_or("-");
        let character = self.session.character().map(|c| c.name.as_str()).unwrap_or("-");
        let action: String = input.chars().take(50).collect();
        info!(step = step.name(), theme, character, action = %action, "story step");

        match self.orchestrator.handle(&self.session, step, input) {
            Ok(Outcome { session, output }) => {
                match step {
                    StoryStep::SuggestCharacter => {
                        self.messages
                            .push(Message::System(format!("Suggested character: {output}")));
                    }
                    StoryStep::Opening => self.messages.push(Message::Narration(output)),
                    StoryStep::Continue => {
                        self.messages.push(Message::User(input.trim().to_string()));
                        self.messages.push(Message::Narration(output));
                    }
                }
                self.session = session;
                self.updated()
            }
            Err(e) => self.fail(step.name(), e),
        }
    }

    fn updated(&self) -> EngineResponse {
        EngineResponse::Updated {
            session: self.session.clone(),
            messages: self.messages.clone(),
        }
    }

    fn fail(&self, operation: &str, err: OrchestratorError) -> EngineResponse {
        error!(operation, retryable = err.is_retryable(), error = %err, "story step failed");

        EngineResponse::Failed {
            session: self.session.clone(),
            message: err.user_message(self.debug),
        }
    }
}
