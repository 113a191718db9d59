//! JSON payloads of the REST API, shared by the server handlers and the
//! client's HTTP wrapper. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifeline::LifelineCounts;
use crate::profile::{MatchResult, PlayerProfile};
use crate::types::UserId;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeNameRequest {
    pub name: String,
}

/// A user as the owner sees it. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
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
    pub name_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    /// The progression slice of this account as a client-side profile.
    pub fn to_profile(&self) -> PlayerProfile {
        PlayerProfile {
            id: self.id.to_string(),
            name: self.name.clone(),
            xp: self.xp,
            coins: self.coins,
            wins: self.wins,
            losses: self.losses,
            games_played: self.games_played,
            streak: self.streak,
            lifelines: self.lifelines.clone(),
            recent_matches: self.recent_matches.clone(),
            owned_frames: self.owned_frames.clone(),
            owned_themes: self.owned_themes.clone(),
            equipped_frame: self.equipped_frame.clone(),
            equipped_theme: self.equipped_theme.clone(),
            version: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserView,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub losses: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games_played: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifelines: Option<LifelineCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_matches: Option<Vec<MatchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipped_frame: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipped_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_frames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_themes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_badges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
}

impl From<&PlayerProfile> for ProfileUpdate {
    fn from(p: &PlayerProfile) -> Self {
        Self {
            xp: Some(p.xp),
            coins: Some(p.coins),
            wins: Some(p.wins),
            losses: Some(p.losses),
            games_played: Some(p.games_played),
            streak: Some(p.streak),
            lifelines: Some(p.lifelines.clone()),
            recent_matches: Some(p.recent_matches.clone()),
            equipped_frame: Some(p.equipped_frame.clone()),
            equipped_theme: Some(p.equipped_theme.clone()),
            owned_frames: Some(p.owned_frames.clone()),
            owned_themes: Some(p.owned_themes.clone()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Social graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub xp: u32,
    pub equipped_frame: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersEnvelope {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFriendRequest {
    pub friend_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestView {
    pub id: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestEnvelope {
    pub request: FriendRequestView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRequest {
    pub id: i64,
    pub sender_id: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
    pub sender_xp: u32,
    pub sender_frame: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRequest {
    pub id: i64,
    pub receiver_id: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub receiver_name: String,
    pub receiver_xp: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestsEnvelope<T> {
    pub requests: Vec<T>,
}

/// A friend as listed on the friends screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendView {
    pub id: UserId,
    pub name: String,
    pub xp: u32,
    pub equipped_frame: String,
    pub games_played: u32,
    pub wins: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendsEnvelope {
    pub friends: Vec<FriendView>,
}

// ---------------------------------------------------------------------------
// Support
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRequest {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: i64,
    pub user_id: UserId,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEnvelope {
    pub ticket: TicketView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketsEnvelope {
    pub tickets: Vec<TicketView>,
}

// ---------------------------------------------------------------------------
// Generic bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,
}
