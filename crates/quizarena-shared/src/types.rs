use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Account identity, a server-assigned UUID v4
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three match formats offered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Ten-player free-for-all against nine bots.
    Classic,
    /// Head-to-head against a single bot.
    Duel,
    /// Two teams of two: the player and a bot teammate against two bots.
    Teams,
}

impl GameMode {
    pub fn total_players(&self) -> u32 {
        match self {
            Self::Classic => crate::constants::CLASSIC_PLAYERS,
            Self::Duel => 2,
            Self::Teams => 4,
        }
    }
}
