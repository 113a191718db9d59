//! Per-question scoring and end-of-match rewards for each game mode.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{MIN_CORRECT_POINTS, POINTS_PER_SECOND};
use crate::profile::MatchResult;
use crate::types::GameMode;

/// Points for a single answer. Wrong answers and timeouts score nothing.
pub fn question_points(correct: bool, remaining_secs: u32) -> u32 {
    if !correct {
        return 0;
    }
    remaining_secs
        .saturating_mul(POINTS_PER_SECOND)
        .max(MIN_CORRECT_POINTS)
}

/// Final scores of a match, shaped by mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FinalScores {
    Classic { bot_scores: Vec<u32>, player: u32 },
    Duel { player: u32, opponent: u32 },
    Teams { team: u32, enemy: u32 },
}

impl FinalScores {
    pub fn mode(&self) -> GameMode {
        match self {
            Self::Classic { .. } => GameMode::Classic,
            Self::Duel { .. } => GameMode::Duel,
            Self::Teams { .. } => GameMode::Teams,
        }
    }

    /// The score credited to the player's match history.
    pub fn player_score(&self) -> u32 {
        match self {
            Self::Classic { player, .. } | Self::Duel { player, .. } => *player,
            Self::Teams { team, .. } => *team,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReward {
    pub position: u32,
    pub total_players: u32,
    pub xp: u32,
    pub coins: u32,
}

impl MatchReward {
    pub fn won(&self) -> bool {
        self.position == 1
    }

    pub fn into_result(self, id: impl Into<String>, date: NaiveDate, score: u32) -> MatchResult {
        MatchResult {
            id: id.into(),
            date,
            position: self.position,
            score,
            total_players: self.total_players,
            xp_gained: self.xp,
            coins_gained: self.coins,
        }
    }
}

/// 1-based place of `player` among the bots, best score first.
///
/// Only strictly higher bot scores push the player down, so a tie with a
/// bot resolves in the player's favour.
pub fn classic_position(bot_scores: &[u32], player: u32) -> u32 {
    1 + bot_scores.iter().filter(|&&s| s > player).count() as u32
}

/// Classic placement reward: ten points of XP and fifteen coins per place
/// above eleventh, with floors of 10 XP and 5 coins.
pub fn classic_reward(position: u32, total_players: u32) -> MatchReward {
    let places_above = 11u32.saturating_sub(position);
    MatchReward {
        position,
        total_players,
        xp: (places_above * 10).max(10),
        coins: (places_above * 15).max(5),
    }
}

pub fn settle(scores: &FinalScores) -> MatchReward {
    let total_players = scores.mode().total_players();
    match scores {
        FinalScores::Classic { bot_scores, player } => {
            classic_reward(classic_position(bot_scores, *player), total_players)
        }
        FinalScores::Duel { player, opponent } => {
            fixed_reward(player >= opponent, total_players, (50, 100), (15, 25))
        }
        FinalScores::Teams { team, enemy } => {
            fixed_reward(team >= enemy, total_players, (45, 80), (12, 20))
        }
    }
}

fn fixed_reward(won: bool, total_players: u32, win: (u32, u32), loss: (u32, u32)) -> MatchReward {
    let (position, (xp, coins)) = if won { (1, win) } else { (2, loss) };
    MatchReward {
        position,
        total_players,
        xp,
        coins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answer_has_a_floor() {
        assert_eq!(question_points(true, 15), 150);
        assert_eq!(question_points(true, 6), 60);
        assert_eq!(question_points(true, 3), 50);
        assert_eq!(question_points(true, 0), 50);
        assert_eq!(question_points(false, 15), 0);
    }

    #[test]
    fn classic_position_counts_higher_bots() {
        let bots = vec![800, 750, 700, 650, 600, 550, 500, 450, 400];

        // Only 800 and 750 beat 720.
        let reward = settle(&FinalScores::Classic {
            bot_scores: bots.clone(),
            player: 720,
        });
        assert_eq!((reward.position, reward.xp, reward.coins), (3, 80, 120));

        let reward = settle(&FinalScores::Classic {
            bot_scores: bots,
            player: 680,
        });
        assert_eq!(reward.position, 4);
        assert_eq!(reward.xp, 70);
        assert_eq!(reward.coins, 105);
        assert_eq!(reward.total_players, 10);
    }

    #[test]
    fn classic_last_place_gets_floors() {
        let reward = classic_reward(10, 10);
        assert_eq!((reward.xp, reward.coins), (10, 15));
        let reward = classic_reward(11, 10);
        assert_eq!((reward.xp, reward.coins), (10, 5));
    }

    #[test]
    fn classic_tie_favours_player() {
        assert_eq!(classic_position(&[500, 500, 300], 500), 1);
        assert_eq!(classic_position(&[600, 500, 300], 500), 2);
    }

    #[test]
    fn duel_is_binary() {
        let win = settle(&FinalScores::Duel { player: 300, opponent: 300 });
        assert_eq!((win.position, win.xp, win.coins), (1, 50, 100));
        assert!(win.won());

        let loss = settle(&FinalScores::Duel { player: 299, opponent: 300 });
        assert_eq!((loss.position, loss.xp, loss.coins, loss.total_players), (2, 15, 25, 2));
    }

    #[test]
    fn teams_use_team_totals() {
        let scores = FinalScores::Teams { team: 900, enemy: 850 };
        let win = settle(&scores);
        assert_eq!((win.xp, win.coins, win.total_players), (45, 80, 4));
        assert_eq!(scores.player_score(), 900);

        let loss = settle(&FinalScores::Teams { team: 100, enemy: 850 });
        assert_eq!((loss.xp, loss.coins), (12, 20));
    }
}
