use thiserror::Error;

use quizarena_shared::error::ProgressionError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection dropped.
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Duplicate resource, or a cooldown with the days still to wait.
    #[error("{message}")]
    Conflict {
        message: String,
        days_left: Option<i64>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Too many attempts, slow down")]
    RateLimited,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Progression(#[from] ProgressionError),

    /// A match action that does not fit the current question state.
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// The match has finished or was aborted.
    #[error("Match is no longer running")]
    MatchClosed,

    #[error("Profile task has stopped")]
    ProfileTaskGone,

    #[error("Cache error: {0}")]
    Cache(String),
}

impl ClientError {
    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::RateLimited | ClientError::Server { .. }
        )
    }

    /// Days until the next name change is allowed, when this is a cooldown.
    pub fn days_left(&self) -> Option<i64> {
        match self {
            ClientError::Conflict { days_left, .. } => *days_left,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Cache(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Cache(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
