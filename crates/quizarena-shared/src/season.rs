//! The ranked season shown above the leaderboard.
//!
//! Only one season is defined so far. Days left are counted to the end
//! date's midnight UTC, rounded up, and never go negative.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInfo {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub icon: String,
    pub color: String,
}

impl SeasonInfo {
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end_date.and_time(chrono::NaiveTime::MIN).and_utc();
        let secs = (end - now).num_seconds();
        if secs <= 0 {
            0
        } else {
            (secs + 86_399) / 86_400
        }
    }

    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        self.start_date <= today && today < self.end_date
    }
}

pub fn current_season() -> SeasonInfo {
    SeasonInfo {
        id: "season_1".into(),
        name: "First Challenge Season".into(),
        start_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap_or_default(),
        end_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap_or_default(),
        icon: "trophy".into(),
        color: "#FFD700".into(),
    }
}

/// Days until the current season ends, as of `now`.
pub fn season_days_left(now: DateTime<Utc>) -> i64 {
    current_season().days_left(now)
}
