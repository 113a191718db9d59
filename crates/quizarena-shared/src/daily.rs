//! Seven-day login reward ladder.
//!
//! Eligibility is decided by calendar date in the caller's timezone, not by
//! a rolling 24-hour window: a claim at 23:59 followed by one at 00:01 the
//! next day continues the streak.

use chrono::{DateTime, Days, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProgressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReward {
    pub day: u32,
    pub coins: u32,
    pub xp: u32,
    pub bonus: bool,
}

pub const DAILY_REWARDS: [DailyReward; 7] = [
    DailyReward { day: 1, coins: 50, xp: 10, bonus: false },
    DailyReward { day: 2, coins: 75, xp: 15, bonus: false },
    DailyReward { day: 3, coins: 100, xp: 20, bonus: false },
    DailyReward { day: 4, coins: 150, xp: 30, bonus: false },
    DailyReward { day: 5, coins: 200, xp: 40, bonus: false },
    DailyReward { day: 6, coins: 300, xp: 50, bonus: false },
    DailyReward { day: 7, coins: 500, xp: 100, bonus: true },
];

/// Persisted claim state: when the last reward was taken and the streak it
/// produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyState {
    pub last_claim: Option<DateTime<Utc>>,
    pub streak: u32,
}

/// Result of evaluating [`DailyState`] against the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyStatus {
    pub claimable: bool,
    /// Streak after applying any reset for a missed day.
    pub streak: u32,
}

impl DailyStatus {
    /// The reward the next claim would pay out.
    pub fn next_reward(&self) -> &'static DailyReward {
        &DAILY_REWARDS[(self.streak % 7) as usize]
    }
}

impl DailyState {
    pub fn status<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DailyStatus {
        let Some(last) = self.last_claim else {
            return DailyStatus {
                claimable: true,
                streak: self.streak,
            };
        };

        let today = now.date_naive();
        let last_day = last.with_timezone(&now.timezone()).date_naive();
        let yesterday = today.checked_sub_days(Days::new(1));

        if last_day == today {
            DailyStatus {
                claimable: false,
                streak: self.streak,
            }
        } else if Some(last_day) == yesterday {
            DailyStatus {
                claimable: true,
                streak: self.streak,
            }
        } else {
            DailyStatus {
                claimable: true,
                streak: 0,
            }
        }
    }

    /// Take today's reward, advancing the streak to `(streak % 7) + 1`.
    pub fn claim<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
    ) -> Result<DailyReward, ProgressionError> {
        let status = self.status(now);
        if !status.claimable {
            return Err(ProgressionError::AlreadyClaimedToday);
        }

        let reward = *status.next_reward();
        self.streak = (status.streak % 7) + 1;
        self.last_claim = Some(now.with_timezone(&Utc));
        Ok(reward)
    }
}
