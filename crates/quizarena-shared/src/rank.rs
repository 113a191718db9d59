//! XP → rank mapping.
//!
//! The XP line is cut into 200-XP levels. Five tiers own five levels each and
//! the sixth tier, mastermind, owns a single open-ended level at the top.

use serde::{Deserialize, Serialize};

use crate::constants::XP_PER_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTier {
    Beginner,
    Intermediate,
    Smart,
    Expert,
    Genius,
    Mastermind,
}

impl RankTier {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Smart => "Smart",
            Self::Expert => "Expert",
            Self::Genius => "Genius",
            Self::Mastermind => "Mastermind",
        }
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

struct TierSpec {
    tier: RankTier,
    color: &'static str,
    levels: u32,
}

const TIERS: [TierSpec; 6] = [
    TierSpec { tier: RankTier::Beginner, color: "#94A3B8", levels: 5 },
    TierSpec { tier: RankTier::Intermediate, color: "#38BDF8", levels: 5 },
    TierSpec { tier: RankTier::Smart, color: "#10B981", levels: 5 },
    TierSpec { tier: RankTier::Expert, color: "#A855F7", levels: 5 },
    TierSpec { tier: RankTier::Genius, color: "#F59E0B", levels: 5 },
    TierSpec { tier: RankTier::Mastermind, color: "#FFD700", levels: 1 },
];

/// Display band reported for XP beyond the last level.
const OVERFLOW_BAND: u32 = 1000;

/// A rank level derived from an XP total. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInfo {
    pub tier: RankTier,
    pub level: u32,
    pub label: String,
    pub color: String,
    #[serde(rename = "minXP")]
    pub min_xp: u32,
    #[serde(rename = "maxXP")]
    pub max_xp: u32,
}

impl RankInfo {
    fn new(spec: &TierSpec, level: u32, min_xp: u32, max_xp: u32) -> Self {
        let label = if spec.tier == RankTier::Mastermind {
            spec.tier.display_name().to_string()
        } else {
            format!("{} {}", spec.tier.display_name(), level)
        };
        Self {
            tier: spec.tier,
            level,
            label,
            color: spec.color.to_string(),
            min_xp,
            max_xp,
        }
    }

    /// Position of this level on the whole ladder, starting at 0 for
    /// beginner 1. Strictly increasing with XP across level boundaries.
    pub fn ordinal(&self) -> u32 {
        let before: u32 = TIERS
            .iter()
            .take_while(|t| t.tier != self.tier)
            .map(|t| t.levels)
            .sum();
        before + self.level - 1
    }

    /// Fraction of the current band already earned, for progress bars.
    pub fn progress(&self, xp: u32) -> f64 {
        let width = self.max_xp.saturating_sub(self.min_xp);
        if width == 0 {
            return 1.0;
        }
        let done = xp.saturating_sub(self.min_xp) as f64 / width as f64;
        done.clamp(0.0, 1.0)
    }
}

/// Map an XP total to its rank level.
///
/// A level matches when `xp < max`, so a value sitting exactly on a boundary
/// belongs to the level above. The final mastermind level matches any XP
/// that reaches it; its `max_xp` is only a display denominator.
pub fn rank_from_xp(xp: u32) -> RankInfo {
    let mut floor = 0u32;
    for spec in &TIERS {
        for level in 1..=spec.levels {
            let max = floor + XP_PER_LEVEL;
            let is_ceiling = spec.tier == RankTier::Mastermind && level == spec.levels;
            if xp < max || is_ceiling {
                return RankInfo::new(spec, level, floor, max);
            }
            floor = max;
        }
    }

    // Unreachable while the table ends with mastermind, kept so the
    // function stays total if the table changes.
    let top = &TIERS[TIERS.len() - 1];
    RankInfo::new(top, 1, floor, floor + OVERFLOW_BAND)
}

/// Total number of levels on the ladder.
pub fn level_count() -> u32 {
    TIERS.iter().map(|t| t.levels).sum()
}
