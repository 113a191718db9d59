//! Synthetic leaderboard shown on the ranks screen.
//!
//! There is no ranked backend yet: every view mixes the real player with a
//! freshly randomized set of bots. Nothing here is persisted.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rank::{rank_from_xp, RankInfo};

pub const BOT_NAMES: [&str; 15] = [
    "Quiz Master",
    "Brain Wave",
    "Knowledge Tank",
    "Mind Flash",
    "Clever Fox",
    "Trivia Ninja",
    "Wisdom King",
    "Puzzle Pro",
    "Genius Spark",
    "Challenge Hero",
    "Logic Prince",
    "Question Wizard",
    "Brainstorm",
    "Know-It-All",
    "Mastermind X",
];

pub const DEFAULT_BOT_COUNT: usize = BOT_NAMES.len();

/// Bot XP is drawn uniformly from this half-open range.
const BOT_XP_MIN: u32 = 500;
const BOT_XP_MAX: u32 = 6500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub xp: u32,
    pub rank: RankInfo,
    pub is_player: bool,
}

/// Build a leaderboard of `bots` random entries plus the player, sorted by
/// XP, highest first.
pub fn generate_leaderboard<R: Rng + ?Sized>(
    rng: &mut R,
    player_name: &str,
    player_xp: u32,
    bots: usize,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = (0..bots)
        .map(|i| {
            let xp = rng.gen_range(BOT_XP_MIN..BOT_XP_MAX);
            LeaderboardEntry {
                name: bot_name(i),
                xp,
                rank: rank_from_xp(xp),
                is_player: false,
            }
        })
        .collect();

    entries.push(LeaderboardEntry {
        name: player_name.to_string(),
        xp: player_xp,
        rank: rank_from_xp(player_xp),
        is_player: true,
    });

    entries.sort_by(|a, b| b.xp.cmp(&a.xp));
    entries
}

/// 1-based position of the player in a generated leaderboard.
pub fn player_position(entries: &[LeaderboardEntry]) -> Option<usize> {
    entries.iter().position(|e| e.is_player).map(|i| i + 1)
}

fn bot_name(i: usize) -> String {
    let base = BOT_NAMES[i % BOT_NAMES.len()];
    match i / BOT_NAMES.len() {
        0 => base.to_string(),
        round => format!("{base} {}", round + 1),
    }
}
