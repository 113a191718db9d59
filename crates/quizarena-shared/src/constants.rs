/// Application name
pub const APP_NAME: &str = "Quiz Arena";

/// XP consumed by every rank level
pub const XP_PER_LEVEL: u32 = 200;

/// Seconds on the clock for each question
pub const TIME_PER_QUESTION_SECS: u32 = 15;

/// How long a time-freeze lifeline pauses the countdown
pub const TIME_FREEZE_SECS: u64 = 10;

/// Minimum points for a correct answer
pub const MIN_CORRECT_POINTS: u32 = 50;

/// Points per remaining second on a correct answer
pub const POINTS_PER_SECOND: u32 = 10;

/// Maximum number of matches kept in a profile's history
pub const RECENT_MATCHES_CAP: usize = 10;

/// Players in a classic free-for-all match (the player plus nine bots)
pub const CLASSIC_PLAYERS: u32 = 10;

/// Coins granted to a freshly registered account
pub const STARTING_COINS: u32 = 500;

/// Friend search: minimum query length and maximum result count
pub const SEARCH_MIN_QUERY_LEN: usize = 2;
pub const SEARCH_MAX_RESULTS: usize = 20;

/// Display name length bounds (characters, after trimming)
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 20;

/// Days a user must wait between two name changes
pub const NAME_CHANGE_COOLDOWN_DAYS: i64 = 60;

/// Minimum password length accepted at registration
pub const PASSWORD_MIN_LEN: usize = 6;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Name of the session cookie set by the server
pub const SESSION_COOKIE: &str = "qa_session";
