#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Narrator,
    User,
    System,
}

impl Speaker {
    /// Key used for the colour table in the UI settings.
    pub fn key(self) -> &'static str {
        match self {
            Speaker::Narrator => "Narrator",
            Speaker::User => "User",
            Speaker::System => "System",
        }
    }
}

/// A line of the transcript shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    User(String),
    Narration(String),
    System(String),
}

impl Message {
    pub fn speaker(&self) -> Speaker {
        match self {
            Message::User(_) => Speaker::User,
            Message::Narration(_) => Speaker::Narrator,
            Message::System(_) => Speaker::System,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::User(t) | Message::Narration(t) | Message::System(t) => t,
        }
    }
}
