use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::character::CharacterEdit;
use crate::model::message::Speaker;
use crate::model::session::SessionStage;
use crate::model::theme::Theme;
use crate::ui::app::{LeftTab, MyApp, ThemeChoice};

pub fn draw_left_panel(ctx: &egui::Context, app: &mut MyApp) {
    egui::SidePanel::left("left")
        .resizable(true)
        .default_width(260.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Story, "Story");
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Settings, "Settings");
            });

            ui.separator();

            let tab = app.ui.left_tab;
            egui::ScrollArea::vertical().show(ui, |ui| match tab {
                LeftTab::Story => draw_story_controls(ui, app),
                LeftTab::Settings => draw_settings(ui, app),
            });
        });
}

fn draw_story_controls(ui: &mut egui::Ui, app: &mut MyApp) {
    let mut command = None;
    let stage = app.ui.session.stage();

    ui.add_enabled_ui(!app.ui.pending, |ui| match stage {
        SessionStage::AwaitingTheme | SessionStage::Ended => {
            ui.heading("New story");
            draw_theme_picker(ui, app);

            if ui.button("Begin").clicked() {
                command = Some(EngineCommand::SelectTheme(app.ui.chosen_theme()));
            }
        }

        SessionStage::AwaitingCharacterConfirm => {
            draw_theme_line(ui, app.ui.session.theme());
            ui.heading("Your protagonist");

            ui.label("Name");
            ui.text_edit_singleline(&mut app.ui.name_edit);

            ui.label("Personality");
            ui.text_edit_multiline(&mut app.ui.personality_edit);

            ui.horizontal(|ui| {
                if ui.button("Suggest another").clicked() {
                    command = Some(EngineCommand::SuggestCharacter);
                }
                if ui.button("Confirm").clicked() {
                    command = Some(EngineCommand::ConfirmCharacter(CharacterEdit {
                        name: Some(app.ui.name_edit.clone()),
                        personality: Some(app.ui.personality_edit.clone()),
                    }));
                }
            });
        }

        SessionStage::AwaitingOpening | SessionStage::InProgress => {
            draw_theme_line(ui, app.ui.session.theme());

            if let Some(character) = app.ui.session.character() {
                ui.heading(&character.name);
                ui.label(&character.personality);
            }

            ui.separator();

            if stage == SessionStage::AwaitingOpening {
                if ui.button("Start story").clicked() {
                    command = Some(EngineCommand::StartStory);
                }
            } else {
                ui.label(format!(
                    "{} chapters so far",
                    app.ui.session.narrative().len()
                ));
                if ui.button("End story").clicked() {
                    command = Some(EngineCommand::EndStory);
                }
            }
        }
    });

    if stage != SessionStage::AwaitingTheme {
        ui.separator();
        if ui.add_enabled(!app.ui.pending, egui::Button::new("Start over")).clicked() {
            command = Some(EngineCommand::NewStory);
        }
    }

    if let Some(cmd) = command {
        app.send_command(cmd);
    }
}

fn draw_theme_picker(ui: &mut egui::Ui, app: &mut MyApp) {
    let selected = match &app.ui.theme_choice {
        ThemeChoice::Preset(theme) => theme.label().to_string(),
        ThemeChoice::Custom => "Custom…".to_string(),
    };

    egui::ComboBox::from_label("Theme")
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for theme in Theme::PRESETS {
                let label = theme.label().to_string();
                ui.selectable_value(&mut app.ui.theme_choice, ThemeChoice::Preset(theme), label);
            }
            ui.selectable_value(&mut app.ui.theme_choice, ThemeChoice::Custom, "Custom…");
        });

    if app.ui.theme_choice == ThemeChoice::Custom {
        ui.add(
            egui::TextEdit::singleline(&mut app.ui.custom_theme)
                .hint_text("e.g. gothic horror"),
        );
    }
}

fn draw_theme_line(ui: &mut egui::Ui, theme: Option<&Theme>) {
    if let Some(theme) = theme {
        ui.label(format!("Theme: {theme}"));
        ui.separator();
    }
}

fn draw_settings(ui: &mut egui::Ui, app: &mut MyApp) {
    let mut command = None;

    ui.label("UI Scale");
    ui.add(egui::Slider::new(&mut app.config.ui.ui_scale, 0.75..=2.0));

    ui.separator();

    ui.collapsing("Colours", |ui| {
        for speaker in [Speaker::Narrator, Speaker::User, Speaker::System] {
            let mut color = app.config.ui.color(speaker);
            ui.horizontal(|ui| {
                if ui.color_edit_button_srgba(&mut color).changed() {
                    app.config.ui.set_color(speaker, color);
                }
                ui.label(speaker.key());
            });
        }
    });

    ui.separator();

    if ui
        .checkbox(&mut app.config.debug, "Show error details")
        .changed()
    {
        command = Some(EngineCommand::SetDebug(app.config.debug));
    }

    ui.separator();

    ui.label(format!("Backend: {}", app.config.backend.model));
    if ui
        .add_enabled(!app.ui.pending, egui::Button::new("Test connection"))
        .clicked()
    {
        command = Some(EngineCommand::TestConnection);
    }
    if let Some(status) = &app.ui.connection_status {
        ui.label(status);
    }

    ui.separator();

    if ui.button("Save settings").clicked() {
        app.save_settings();
    }

    if let Some(cmd) = command {
        app.send_command(cmd);
    }
}
