//! The three in-match lifelines and their store prices.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProgressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifelineKind {
    /// Hides two wrong options of the current question.
    FiftyFifty,
    /// Pauses the countdown for ten seconds.
    TimeFreeze,
    /// Absorbs the penalty feedback of the next wrong answer.
    Shield,
}

impl LifelineKind {
    pub const ALL: [LifelineKind; 3] = [Self::FiftyFifty, Self::TimeFreeze, Self::Shield];

    /// Storage key, as found in a profile's lifeline map.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FiftyFifty => "fifty_fifty",
            Self::TimeFreeze => "time_freeze",
            Self::Shield => "shield",
        }
    }

    /// Store price in coins.
    pub fn price(&self) -> u32 {
        match self {
            Self::FiftyFifty => 50,
            Self::TimeFreeze => 75,
            Self::Shield => 100,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FiftyFifty => "Remove two wrong answers",
            Self::TimeFreeze => "Stop the timer for 10 seconds",
            Self::Shield => "Protect against losing points",
        }
    }
}

impl std::fmt::Display for LifelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for LifelineKind {
    type Err = ProgressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| ProgressionError::UnknownLifeline(s.to_string()))
    }
}

/// Lifeline counts keyed by kind.
pub type LifelineCounts = BTreeMap<LifelineKind, u32>;

/// Inventory handed to every new account.
pub fn starting_lifelines() -> LifelineCounts {
    BTreeMap::from([
        (LifelineKind::FiftyFifty, 2),
        (LifelineKind::TimeFreeze, 1),
        (LifelineKind::Shield, 1),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_str() {
        for kind in LifelineKind::ALL {
            assert_eq!(kind.id().parse::<LifelineKind>().unwrap(), kind);
        }
        assert!(matches!(
            "double_points".parse::<LifelineKind>(),
            Err(ProgressionError::UnknownLifeline(_))
        ));
    }

    #[test]
    fn counts_serialize_as_id_map() {
        let json = serde_json::to_value(starting_lifelines()).unwrap();
        assert_eq!(json, serde_json::json!({"fifty_fifty": 2, "time_freeze": 1, "shield": 1}));
    }
}
