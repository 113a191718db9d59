use thiserror::Error;

use crate::cosmetics::CosmeticKind;
use crate::lifeline::LifelineKind;

/// Failures of the client-side progression rules. None of them mutate state:
/// a command that returns one of these leaves the profile untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("Not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u32, available: u32 },

    #[error("No {0} lifeline left")]
    NoLifelineLeft(LifelineKind),

    #[error("Unknown lifeline: {0}")]
    UnknownLifeline(String),

    #[error("Unknown {kind}: {id}")]
    UnknownCosmetic { kind: CosmeticKind, id: String },

    #[error("You do not own the {kind} {id}")]
    NotOwned { kind: CosmeticKind, id: String },

    #[error("Daily reward already claimed today")]
    AlreadyClaimedToday,

    #[error("Invalid match result: {0}")]
    InvalidMatch(String),
}
