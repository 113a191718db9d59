use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none, or the row is not
    /// visible to the acting user.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// Registration with an email that already has an account.
    #[error("Email already registered")]
    EmailTaken,

    /// Input that violates a domain rule (self friend request, impossible
    /// counters, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A friendship edge already links the two users.
    #[error("Users are already friends")]
    AlreadyFriends,

    /// A pending request already exists between the two users.
    #[error("A friend request is already pending")]
    DuplicatePending,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
