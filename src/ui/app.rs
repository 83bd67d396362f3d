use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use tracing::error;

use crate::config::{self, AppConfig};
use crate::engine::engine::Engine;
use crate::engine::llm_client::GenerationClient;
use crate::engine::orchestrator::SessionOrchestrator;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::message::{Message, Speaker};
use crate::model::session::{SessionStage, StorySession};
use crate::model::theme::Theme;
use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;

/* =========================
   Tabs
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeftTab {
    #[default]
    Story,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeChoice {
    Preset(Theme),
    Custom,
}

impl Default for ThemeChoice {
    fn default() -> Self {
        ThemeChoice::Preset(Theme::Fantasy)
    }
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub input_text: String,
    pub theme_choice: ThemeChoice,
    pub custom_theme: String,
    pub name_edit: String,
    pub personality_edit: String,

    /// Latest session snapshot sent back by the engine.
    pub session: StorySession,
    pub rendered_messages: Vec<Message>,

    pub pending: bool,
    pub error: Option<String>,
    pub connection_status: Option<String>,
    pub should_auto_scroll: bool,
    pub left_tab: LeftTab,
}

impl UiState {
    pub fn chosen_theme(&self) -> Theme {
        match &self.theme_choice {
            ThemeChoice::Preset(theme) => theme.clone(),
            ThemeChoice::Custom => Theme::parse(&self.custom_theme),
        }
    }

    pub fn apply_response(&mut self, resp: EngineResponse) {
        match resp {
            EngineResponse::Updated { session, messages } => {
                self.sync_character_form(&session);
                self.session = session;
                self.rendered_messages = messages;
                self.should_auto_scroll = true;
            }
            EngineResponse::Failed { session, message } => {
                self.sync_character_form(&session);
                self.session = session;
                self.error = Some(message);
            }
            EngineResponse::ConnectionStatus(status) => {
                self.connection_status = Some(status);
            }
        }
        self.pending = false;
    }

    /// Fills the confirm form from a new suggestion and empties it when a story starts over.
    fn sync_character_form(&mut self, next: &StorySession) {
        let entering_confirm = next.stage() == SessionStage::AwaitingCharacterConfirm
            && self.session.stage() != SessionStage::AwaitingCharacterConfirm;

        match next.suggestion() {
            Some(character)
                if next.stage() == SessionStage::AwaitingCharacterConfirm
                    && (entering_confirm || self.session.suggestion() != Some(character)) =>
            {
                self.name_edit = character.name.clone();
                self.personality_edit = character.personality.clone();
            }
            None if entering_confirm || next.stage() == SessionStage::AwaitingTheme => {
                self.name_edit.clear();
                self.personality_edit.clear();
            }
            _ => {}
        }
    }
}

/* =========================
   App
   ========================= */

pub struct MyApp {
    pub ui: UiState,
    pub config: AppConfig,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl MyApp {
    pub fn new(config: AppConfig, client: Box<dyn GenerationClient + Send>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let orchestrator = SessionOrchestrator::new(client).with_retry(config.retry.policy());
        let debug = config.debug;

        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, orchestrator, debug);
            engine.run();
        });

        Self {
            ui: UiState::default(),
            config,
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&mut self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.ui.error = Some("The story engine has stopped. Please restart the app.".into());
            return;
        }
        self.ui.pending = true;
        self.ui.error = None;
    }

    pub fn save_settings(&mut self) {
        if let Err(err) = config::io::save(&self.config) {
            error!("failed to save settings: {err:#}");
            self.ui.error = Some("Could not save settings.".into());
        }
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let speaker = msg.speaker();
        let bg = self.config.ui.color(speaker);
        let text = match msg {
            Message::User(t) => format!("You: {t}"),
            _ => msg.text().to_string(),
        };

        ui.add_space(6.0);

        if speaker == Speaker::User {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &text);
            });
        } else {
            bubble(ui, bg, &text);
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.config.ui.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.ui.apply_response(resp);
        }

        draw_left_panel(ctx, self);
        draw_center_panel(ctx, self);

        if self.ui.pending {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.ui.should_auto_scroll = false;
    }
}

/* =========================
   UI Helpers
   ========================= */

fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(egui::CornerRadius::same(8))
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}
