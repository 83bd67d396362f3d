use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::session::SessionStage;
use super::app::MyApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut MyApp) {
    let input_id = egui::Id::new("action_input_box");

    // ---------- Status ----------
    if app.ui.pending || app.ui.error.is_some() {
        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            if app.ui.pending {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("The story engine is writing…");
                });
            }
            if let Some(err) = &app.ui.error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }
        });
    }

    // ---------- Input bar ----------
    let can_act = app.ui.session.stage() == SessionStage::InProgress && !app.ui.pending;

    egui::TopBottomPanel::bottom("action_input").show(ctx, |ui| {
        let mut send_now = false;

        ui.add_enabled_ui(can_act, |ui| {
            ui.horizontal(|ui| {
                let response = ui.add_sized(
                    [ui.available_width() - 60.0, 60.0],
                    egui::TextEdit::multiline(&mut app.ui.input_text)
                        .id(input_id)
                        .hint_text("What do you do?")
                        .lock_focus(true),
                );

                // Enter sends, Shift+Enter adds a line
                if response.has_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift)
                {
                    send_now = true;
                }

                if ui.button("Act").clicked() {
                    send_now = true;
                }
            });
        });

        if send_now && can_act {
            let action = app.ui.input_text.trim().to_string();

            if !action.is_empty() {
                app.send_command(EngineCommand::Continue(action));
                app.ui.input_text.clear();
            }

            ui.memory_mut(|m| m.request_focus(input_id));
        }
    });

    // ---------- Story ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        if app.ui.rendered_messages.is_empty() {
            ui.weak("Pick a theme on the left to begin a story.");
        }

        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in &app.ui.rendered_messages {
                    app.draw_message(ui, msg);
                }
            });
    });
}
