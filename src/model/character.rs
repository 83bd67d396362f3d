use serde::{Deserialize, Serialize};

/// Name given to a protagonist when the model's reply has none we can read.
pub const PLACEHOLDER_NAME: &str = "Hero";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub personality: String,
}

impl Character {
    pub fn new(name: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personality: personality.into(),
        }
    }

    pub fn placeholder(personality: impl Into<String>) -> Self {
        Self::new(PLACEHOLDER_NAME, personality)
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.personality.trim().is_empty()
    }
}

/// A player's edit of the suggested protagonist.
///
/// Fields left `None` (or blank) keep the suggested value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEdit {
    pub name: Option<String>,
    pub personality: Option<String>,
}

impl CharacterEdit {
    pub fn keep_suggestion() -> Self {
        Self::default()
    }

    pub fn merge_onto(self, suggestion: Option<&Character>) -> Character {
        let pick = |edited: Option<String>, suggested: Option<&String>| {
            edited
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .or_else(|| suggested.map(|value| value.trim().to_string()))
                .unwrap_or_default()
        };

        Character {
            name: pick(self.name, suggestion.map(|c| &c.name)),
            personality: pick(self.personality, suggestion.map(|c| &c.personality)),
        }
    }
}

impl From<Character> for CharacterEdit {
    fn from(character: Character) -> Self {
        Self {
            name: Some(character.name),
            personality: Some(character.personality),
        }
    }
}
