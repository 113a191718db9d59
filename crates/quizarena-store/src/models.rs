//! Row types persisted in SQLite and the column codecs shared by the CRUD
//! modules.
//!
//! Joined read models (friend lists, request lists, tickets) reuse the wire
//! types from [`quizarena_shared::protocol`] directly.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quizarena_shared::lifeline::LifelineCounts;
use quizarena_shared::profile::MatchResult;
use quizarena_shared::protocol::UserView;
use quizarena_shared::types::UserId;

pub use quizarena_shared::protocol::{
    FriendRequestStatus, FriendRequestView, FriendView, IncomingRequest, OutgoingRequest,
    TicketView, UserSummary,
};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account, including its credential hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub xp: u32,
    pub coins: u32,
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    pub streak: u32,
    pub lifelines: LifelineCounts,
    pub equipped_frame: String,
    pub equipped_theme: String,
    pub owned_frames: Vec<String>,
    pub owned_themes: Vec<String>,
    pub owned_badges: Vec<String>,
    pub recent_matches: Vec<MatchResult>,
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
    /// Last successful name change; gates the rename cooldown.
    pub name_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The owner-facing view, with the password hash stripped.
    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            xp: self.xp,
            coins: self.coins,
            wins: self.wins,
            losses: self.losses,
            games_played: self.games_played,
            streak: self.streak,
            lifelines: self.lifelines.clone(),
            equipped_frame: self.equipped_frame.clone(),
            equipped_theme: self.equipped_theme.clone(),
            owned_frames: self.owned_frames.clone(),
            owned_themes: self.owned_themes.clone(),
            owned_badges: self.owned_badges.clone(),
            recent_matches: self.recent_matches.clone(),
            sound_enabled: self.sound_enabled,
            notifications_enabled: self.notifications_enabled,
            name_changed_at: self.name_changed_at,
            created_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A login session addressed by an opaque cookie token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Column codecs
// ---------------------------------------------------------------------------

/// Fixed-width UTC timestamps so that string comparison in SQL orders them
/// chronologically.
pub(crate) fn encode_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The current time at the precision timestamps are stored with, so a value
/// written and read back compares equal.
pub(crate) fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_user_id(idx: usize, s: &str) -> rusqlite::Result<UserId> {
    UserId::parse(s).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_json<T: DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_status(idx: usize, s: &str) -> rusqlite::Result<FriendRequestStatus> {
    FriendRequestStatus::parse(s).ok_or_else(|| {
        conversion_err(
            idx,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown request status '{s}'"),
            ),
        )
    })
}

/// Map `QueryReturnedNoRows` to [`crate::StoreError::NotFound`].
pub(crate) fn not_found(e: rusqlite::Error) -> crate::StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => crate::StoreError::NotFound,
        other => crate::StoreError::Sqlite(other),
    }
}
