use std::fmt;

use serde::{Deserialize, Serialize};

/// Genre of a story. Fixed for the lifetime of a session once selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Fantasy,
    ScienceFiction,
    Mystery,
    #[default]
    Adventure,
    Custom(String),
}

impl Theme {
    pub const PRESETS: [Theme; 4] = [
        Theme::Fantasy,
        Theme::ScienceFiction,
        Theme::Mystery,
        Theme::Adventure,
    ];

    /// Reads a theme typed by the player. Blank input means adventure.
    pub fn parse(input: &str) -> Theme {
        let trimmed = input.trim();

        match trimmed.to_lowercase().as_str() {
            "" | "adventure" => Theme::Adventure,
            "fantasy" => Theme::Fantasy,
            "science fiction" | "science-fiction" | "sci-fi" | "scifi" => Theme::ScienceFiction,
            "mystery" => Theme::Mystery,
            _ => Theme::Custom(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Theme::Fantasy => "Fantasy",
            Theme::ScienceFiction => "Science Fiction",
            Theme::Mystery => "Mystery",
            Theme::Adventure => "Adventure",
            Theme::Custom(label) => label.trim(),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognises_presets_in_any_case() {
        assert_eq!(Theme::parse("FANTASY"), Theme::Fantasy);
        assert_eq!(Theme::parse(" sci-fi "), Theme::ScienceFiction);
        assert_eq!(Theme::parse("Science Fiction"), Theme::ScienceFiction);
        assert_eq!(Theme::parse("mystery"), Theme::Mystery);
    }

    #[test]
    fn blank_input_falls_back_to_adventure() {
        assert_eq!(Theme::parse("   "), Theme::Adventure);
        assert_eq!(Theme::default(), Theme::Adventure);
    }

    #[test]
    fn anything_else_is_custom_and_trimmed() {
        let theme = Theme::parse("  cozy solarpunk ");
        assert_eq!(theme, Theme::Custom("cozy solarpunk".into()));
        assert_eq!(theme.to_string(), "cozy solarpunk");
    }
}
