//! Achievement catalogue and progress evaluation against a profile.

use serde::Serialize;

use crate::profile::PlayerProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    Wins,
    Games,
    Streak,
    Xp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: AchievementKind,
    pub requirement: u32,
    pub reward_xp: u32,
    pub reward_coins: u32,
}

const fn ach(
    id: &'static str,
    title: &'static str,
    kind: AchievementKind,
    requirement: u32,
    reward_xp: u32,
    reward_coins: u32,
) -> Achievement {
    Achievement {
        id,
        title,
        kind,
        requirement,
        reward_xp,
        reward_coins,
    }
}

pub const ACHIEVEMENTS: [Achievement; 11] = [
    ach("first_win", "First Victory", AchievementKind::Wins, 1, 50, 100),
    ach("wins_10", "Warrior", AchievementKind::Wins, 10, 100, 200),
    ach("wins_50", "Champion", AchievementKind::Wins, 50, 250, 500),
    ach("wins_100", "Legendary", AchievementKind::Wins, 100, 500, 1000),
    ach("games_25", "Active", AchievementKind::Games, 25, 75, 150),
    ach("games_100", "Quiz Addict", AchievementKind::Games, 100, 200, 400),
    ach("streak_3", "Triple Streak", AchievementKind::Streak, 3, 50, 75),
    ach("streak_5", "Unbeatable", AchievementKind::Streak, 5, 100, 200),
    ach("streak_10", "Winning Machine", AchievementKind::Streak, 10, 300, 500),
    ach("xp_1000", "Rising Expert", AchievementKind::Xp, 1000, 100, 200),
    ach("xp_5000", "Scholar", AchievementKind::Xp, 5000, 250, 500),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub achievement: Achievement,
    pub current: u32,
    pub progress: f64,
    pub unlocked: bool,
}

impl Achievement {
    fn current_value(&self, profile: &PlayerProfile) -> u32 {
        match self.kind {
            AchievementKind::Wins => profile.wins,
            AchievementKind::Games => profile.games_played,
            AchievementKind::Streak => profile.streak,
            AchievementKind::Xp => profile.xp,
        }
    }

    pub fn evaluate(&self, profile: &PlayerProfile) -> AchievementProgress {
        let current = self.current_value(profile);
        AchievementProgress {
            achievement: *self,
            current,
            progress: (current as f64 / self.requirement as f64).min(1.0),
            unlocked: current >= self.requirement,
        }
    }
}

pub fn evaluate_all(profile: &PlayerProfile) -> Vec<AchievementProgress> {
    ACHIEVEMENTS.iter().map(|a| a.evaluate(profile)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_tracks_profile_counters() {
        let mut profile = PlayerProfile::new("p1", "Player");
        profile.wins = 5;
        profile.xp = 1200;

        let all = evaluate_all(&profile);
        let by_id = |id: &str| all.iter().find(|p| p.achievement.id == id).unwrap();

        assert!(by_id("first_win").unlocked);
        assert!(!by_id("wins_10").unlocked);
        assert!((by_id("wins_10").progress - 0.5).abs() < f64::EPSILON);
        assert!(by_id("xp_1000").unlocked);
        assert_eq!(by_id("xp_1000").progress, 1.0);
        assert_eq!(by_id("streak_3").current, 0);
    }
}
