//! The player profile aggregate and its mutation rules.
//!
//! Every mutating method either applies completely and bumps `version`, or
//! returns an error and leaves the profile exactly as it was.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{RECENT_MATCHES_CAP, STARTING_COINS};
use crate::cosmetics::{self, default_equipped, default_owned, CosmeticKind, DEFAULT_COSMETIC};
use crate::error::ProgressionError;
use crate::lifeline::{starting_lifelines, LifelineCounts, LifelineKind};
use crate::rank::{rank_from_xp, RankInfo};

/// Outcome of one finished match. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: String,
    pub date: NaiveDate,
    pub position: u32,
    pub score: u32,
    pub total_players: u32,
    pub xp_gained: u32,
    pub coins_gained: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: String,
    pub name: String,
    pub xp: u32,
    pub coins: u32,
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    /// Consecutive top-3 finishes.
    pub streak: u32,
    pub lifelines: LifelineCounts,
    /// Most recent first, at most [`RECENT_MATCHES_CAP`] entries.
    pub recent_matches: Vec<MatchResult>,
    #[serde(default = "default_owned")]
    pub owned_frames: Vec<String>,
    #[serde(default = "default_owned")]
    pub owned_themes: Vec<String>,
    #[serde(default = "default_equipped")]
    pub equipped_frame: String,
    #[serde(default = "default_equipped")]
    pub equipped_theme: String,
    /// Bumped on every successful mutation.
    #[serde(default)]
    pub version: u64,
}

/// What [`PlayerProfile::record_match`] reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecorded {
    pub rank_before: RankInfo,
    pub rank_after: RankInfo,
}

impl MatchRecorded {
    pub fn ranked_up(&self) -> bool {
        self.rank_after.ordinal() > self.rank_before.ordinal()
    }
}

/// What picking a store cosmetic did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticPurchase {
    /// Paid for, now owned and equipped.
    Bought { coins_left: u32 },
    /// Already owned, equipped again for free.
    Equipped,
}

impl PlayerProfile {
    /// A fresh profile with the signup defaults.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            xp: 0,
            coins: STARTING_COINS,
            wins: 0,
            losses: 0,
            games_played: 0,
            streak: 0,
            lifelines: starting_lifelines(),
            recent_matches: Vec::new(),
            owned_frames: default_owned(),
            owned_themes: default_owned(),
            equipped_frame: default_equipped(),
            equipped_theme: default_equipped(),
            version: 0,
        }
    }

    pub fn rank(&self) -> RankInfo {
        rank_from_xp(self.xp)
    }

    pub fn lifeline_count(&self, kind: LifelineKind) -> u32 {
        self.lifelines.get(&kind).copied().unwrap_or(0)
    }

    /// Spend `price` coins for one more lifeline of `kind`.
    pub fn buy_lifeline(&mut self, kind: LifelineKind) -> Result<u32, ProgressionError> {
        let price = kind.price();
        if self.coins < price {
            return Err(ProgressionError::InsufficientCoins {
                needed: price,
                available: self.coins,
            });
        }
        self.coins -= price;
        let count = self.lifelines.entry(kind).or_insert(0);
        *count += 1;
        let count = *count;
        self.touch();
        Ok(count)
    }

    /// Consume one lifeline of `kind`, returning how many are left.
    pub fn use_lifeline(&mut self, kind: LifelineKind) -> Result<u32, ProgressionError> {
        match self.lifelines.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                let left = *count;
                self.touch();
                Ok(left)
            }
            _ => Err(ProgressionError::NoLifelineLeft(kind)),
        }
    }

    pub fn owns(&self, kind: CosmeticKind, id: &str) -> bool {
        id == DEFAULT_COSMETIC || self.owned(kind).iter().any(|owned| owned == id)
    }

    pub fn equipped(&self, kind: CosmeticKind) -> &str {
        match kind {
            CosmeticKind::Frame => &self.equipped_frame,
            CosmeticKind::Theme => &self.equipped_theme,
        }
    }

    pub fn buy_frame(&mut self, id: &str) -> Result<CosmeticPurchase, ProgressionError> {
        self.buy_cosmetic(CosmeticKind::Frame, id)
    }

    pub fn buy_theme(&mut self, id: &str) -> Result<CosmeticPurchase, ProgressionError> {
        self.buy_cosmetic(CosmeticKind::Theme, id)
    }

    /// Buy and equip a store item. An item already owned is only equipped.
    pub fn buy_cosmetic(
        &mut self,
        kind: CosmeticKind,
        id: &str,
    ) -> Result<CosmeticPurchase, ProgressionError> {
        if self.owns(kind, id) {
            self.equip(kind, id)?;
            return Ok(CosmeticPurchase::Equipped);
        }
        let item = cosmetics::find(kind, id).ok_or_else(|| ProgressionError::UnknownCosmetic {
            kind,
            id: id.to_string(),
        })?;
        if self.coins < item.price {
            return Err(ProgressionError::InsufficientCoins {
                needed: item.price,
                available: self.coins,
            });
        }
        self.coins -= item.price;
        self.owned_mut(kind).push(id.to_string());
        *self.equipped_mut(kind) = id.to_string();
        self.touch();
        Ok(CosmeticPurchase::Bought {
            coins_left: self.coins,
        })
    }

    /// Switch to an owned frame or theme.
    pub fn equip(&mut self, kind: CosmeticKind, id: &str) -> Result<(), ProgressionError> {
        if !self.owns(kind, id) {
            return Err(ProgressionError::NotOwned {
                kind,
                id: id.to_string(),
            });
        }
        *self.equipped_mut(kind) = id.to_string();
        self.touch();
        Ok(())
    }

    fn owned(&self, kind: CosmeticKind) -> &[String] {
        match kind {
            CosmeticKind::Frame => &self.owned_frames,
            CosmeticKind::Theme => &self.owned_themes,
        }
    }

    fn owned_mut(&mut self, kind: CosmeticKind) -> &mut Vec<String> {
        match kind {
            CosmeticKind::Frame => &mut self.owned_frames,
            CosmeticKind::Theme => &mut self.owned_themes,
        }
    }

    fn equipped_mut(&mut self, kind: CosmeticKind) -> &mut String {
        match kind {
            CosmeticKind::Frame => &mut self.equipped_frame,
            CosmeticKind::Theme => &mut self.equipped_theme,
        }
    }

    pub fn add_xp(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
        self.touch();
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
        self.touch();
    }

    /// Fold a finished match into the profile.
    ///
    /// First place counts as a win, anything below third as a loss; second
    /// and third count as neither but keep the top-3 streak going.
    pub fn record_match(&mut self, result: MatchResult) -> Result<MatchRecorded, ProgressionError> {
        if result.position == 0 || result.position > result.total_players {
            return Err(ProgressionError::InvalidMatch(format!(
                "position {} out of 1..={}",
                result.position, result.total_players
            )));
        }

        let rank_before = self.rank();

        self.games_played += 1;
        if result.position == 1 {
            self.wins += 1;
        }
        if result.position > 3 {
            self.losses += 1;
        }
        self.streak = if result.position <= 3 { self.streak + 1 } else { 0 };
        self.xp = self.xp.saturating_add(result.xp_gained);
        self.coins = self.coins.saturating_add(result.coins_gained);

        self.recent_matches.insert(0, result);
        self.recent_matches.truncate(RECENT_MATCHES_CAP);
        self.touch();

        Ok(MatchRecorded {
            rank_before,
            rank_after: self.rank(),
        })
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(position: u32, xp: u32, coins: u32) -> MatchResult {
        MatchResult {
            id: format!("m_{position}_{xp}"),
            date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            position,
            score: 1000,
            total_players: 10,
            xp_gained: xp,
            coins_gained: coins,
        }
    }

    #[test]
    fn buy_with_insufficient_coins_changes_nothing() {
        let mut profile = PlayerProfile::new("p1", "Player");
        profile.coins = 40;
        let before = profile.clone();

        let err = profile.buy_lifeline(LifelineKind::FiftyFifty).unwrap_err();
        assert_eq!(
            err,
            ProgressionError::InsufficientCoins { needed: 50, available: 40 }
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn buy_spends_exact_price_and_adds_one() {
        let mut profile = PlayerProfile::new("p1", "Player");
        let shields = profile.lifeline_count(LifelineKind::Shield);

        let count = profile.buy_lifeline(LifelineKind::Shield).unwrap();
        assert_eq!(count, shields + 1);
        assert_eq!(profile.coins, STARTING_COINS - 100);
        assert_eq!(profile.lifeline_count(LifelineKind::Shield), shields + 1);
        assert_eq!(profile.version, 1);
    }

    #[test]
    fn use_with_zero_count_fails_without_change() {
        let mut profile = PlayerProfile::new("p1", "Player");
        profile.lifelines.insert(LifelineKind::TimeFreeze, 0);
        let before = profile.clone();

        assert_eq!(
            profile.use_lifeline(LifelineKind::TimeFreeze),
            Err(ProgressionError::NoLifelineLeft(LifelineKind::TimeFreeze))
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn use_decrements_by_one() {
        let mut profile = PlayerProfile::new("p1", "Player");
        assert_eq!(profile.use_lifeline(LifelineKind::FiftyFifty), Ok(1));
        assert_eq!(profile.use_lifeline(LifelineKind::FiftyFifty), Ok(0));
        assert!(profile.use_lifeline(LifelineKind::FiftyFifty).is_err());
    }

    #[test]
    fn record_match_updates_counters() {
        let mut profile = PlayerProfile::new("p1", "Player");

        profile.record_match(result(1, 100, 150)).unwrap();
        profile.record_match(result(2, 90, 135)).unwrap();
        profile.record_match(result(7, 40, 60)).unwrap();

        assert_eq!(profile.games_played, 3);
        assert_eq!(profile.wins, 1);
        assert_eq!(profile.losses, 1);
        assert_eq!(profile.streak, 0);
        assert_eq!(profile.xp, 230);
        assert_eq!(profile.coins, STARTING_COINS + 345);
        assert!(profile.games_played >= profile.wins + profile.losses);
        assert_eq!(profile.recent_matches[0].position, 7);
    }

    #[test]
    fn recent_matches_are_capped() {
        let mut profile = PlayerProfile::new("p1", "Player");
        for i in 0..15 {
            profile.record_match(result(2, i, 0)).unwrap();
        }
        assert_eq!(profile.recent_matches.len(), RECENT_MATCHES_CAP);
        assert_eq!(profile.recent_matches[0].xp_gained, 14);
        assert_eq!(profile.streak, 15);
    }

    #[test]
    fn record_match_reports_rank_up() {
        let mut profile = PlayerProfile::new("p1", "Player");
        profile.xp = 190;
        let recorded = profile.record_match(result(1, 20, 0)).unwrap();
        assert!(recorded.ranked_up());
        assert_eq!(recorded.rank_after.level, 2);
    }

    #[test]
    fn buying_a_frame_spends_owns_and_equips() {
        let mut profile = PlayerProfile::new("p1", "Player");
        let bought = profile.buy_frame("frame_gold").unwrap();
        assert_eq!(bought, CosmeticPurchase::Bought { coins_left: 0 });
        assert_eq!(profile.owned_frames, vec!["default", "frame_gold"]);
        assert_eq!(profile.equipped(CosmeticKind::Frame), "frame_gold");
        assert_eq!(profile.equipped_theme, DEFAULT_COSMETIC);
        assert_eq!(profile.version, 1);
    }

    #[test]
    fn cosmetic_without_coins_changes_nothing() {
        let mut profile = PlayerProfile::new("p1", "Player");
        profile.coins = 399;
        let before = profile.clone();

        assert_eq!(
            profile.buy_theme("theme_ocean"),
            Err(ProgressionError::InsufficientCoins { needed: 400, available: 399 })
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn owned_cosmetic_is_equipped_for_free() {
        let mut profile = PlayerProfile::new("p1", "Player");
        profile.coins = 1000;
        profile.buy_frame("frame_fire").unwrap();
        profile.buy_frame("frame_ice").unwrap();
        assert_eq!(profile.coins, 400);
        assert_eq!(profile.equipped_frame, "frame_ice");

        assert_eq!(profile.buy_frame("frame_fire"), Ok(CosmeticPurchase::Equipped));
        assert_eq!(profile.coins, 400);
        assert_eq!(profile.equipped_frame, "frame_fire");
        assert_eq!(profile.owned_frames.len(), 3);

        profile.equip(CosmeticKind::Frame, DEFAULT_COSMETIC).unwrap();
        assert_eq!(profile.equipped_frame, DEFAULT_COSMETIC);
    }

    #[test]
    fn unknown_or_unowned_cosmetics_are_refused() {
        let mut profile = PlayerProfile::new("p1", "Player");
        let before = profile.clone();

        assert!(matches!(
            profile.buy_theme("frame_fire"),
            Err(ProgressionError::UnknownCosmetic { kind: CosmeticKind::Theme, .. })
        ));
        assert!(matches!(
            profile.equip(CosmeticKind::Theme, "theme_royal"),
            Err(ProgressionError::NotOwned { .. })
        ));
        assert_eq!(profile, before);
    }

    #[test]
    fn profiles_without_cosmetics_load_with_defaults() {
        let mut json = serde_json::to_value(PlayerProfile::new("p1", "Player")).unwrap();
        let obj = json.as_object_mut().unwrap();
        for key in ["ownedFrames", "ownedThemes", "equippedFrame", "equippedTheme"] {
            obj.remove(key);
        }
        let profile: PlayerProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.owned_frames, default_owned());
        assert_eq!(profile.equipped_theme, DEFAULT_COSMETIC);
    }

    #[test]
    fn record_match_rejects_impossible_position() {
        let mut profile = PlayerProfile::new("p1", "Player");
        let before = profile.clone();
        assert!(profile.record_match(result(0, 10, 5)).is_err());
        assert!(profile.record_match(result(11, 10, 5)).is_err());
        assert_eq!(profile, before);
    }
}
