use serde::{Deserialize, Serialize};
use egui::Color32;
use std::collections::HashMap;

use crate::model::message::Speaker;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    // Speaker → color mapping
    pub speaker_colors: HashMap<String, [u8; 4]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut speaker_colors = HashMap::new();

        speaker_colors.insert(Speaker::User.key().into(), [40, 70, 120, 255]);
        speaker_colors.insert(Speaker::Narrator.key().into(), [40, 90, 60, 255]);
        speaker_colors.insert(Speaker::System.key().into(), [80, 80, 80, 255]);

        Self {
            ui_scale: 1.0,
            speaker_colors,
        }
    }
}

impl UiSettings {
    pub fn color(&self, speaker: Speaker) -> Color32 {
        self.speaker_colors
            .get(speaker.key())
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }

    pub fn set_color(&mut self, speaker: Speaker, color: Color32) {
        self.speaker_colors.insert(
            speaker.key().to_string(),
            [color.r(), color.g(), color.b(), color.a()],
        );
    }
}
