//! # quizarena-shared
//!
//! Pure domain logic and wire types shared by the Quiz Arena client and
//! server: XP ranks, match rewards, the lifeline and cosmetics economy, the
//! daily reward ladder, leaderboard synthesis with its season, and the JSON
//! payloads of the REST API.
//!
//! Nothing in this crate performs I/O. Functions that need randomness take
//! an `&mut impl Rng` so callers (and tests) control the source.

pub mod achievements;
pub mod constants;
pub mod cosmetics;
pub mod daily;
pub mod error;
pub mod leaderboard;
pub mod lifeline;
pub mod profile;
pub mod protocol;
pub mod questions;
pub mod rank;
pub mod rewards;
pub mod season;
pub mod types;

pub use cosmetics::CosmeticKind;
pub use error::ProgressionError;
pub use lifeline::LifelineKind;
pub use profile::{CosmeticPurchase, MatchResult, PlayerProfile};
pub use rank::{rank_from_xp, RankInfo, RankTier};
pub use types::UserId;
