//! v001 -- Initial schema creation.
//!
//! Creates the account tables: `users`, `sessions` and `support_tickets`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id                    TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    email                 TEXT NOT NULL UNIQUE,        -- lower-cased
    password_hash         TEXT NOT NULL,
    name                  TEXT NOT NULL DEFAULT '',
    xp                    INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
    coins                 INTEGER NOT NULL DEFAULT 500 CHECK (coins >= 0),
    wins                  INTEGER NOT NULL DEFAULT 0,
    losses                INTEGER NOT NULL DEFAULT 0,
    games_played          INTEGER NOT NULL DEFAULT 0,
    streak                INTEGER NOT NULL DEFAULT 0,
    lifelines             TEXT NOT NULL,               -- JSON object
    equipped_frame        TEXT NOT NULL DEFAULT 'default',
    equipped_theme        TEXT NOT NULL DEFAULT 'default',
    owned_frames          TEXT NOT NULL DEFAULT '["default"]',
    owned_themes          TEXT NOT NULL DEFAULT '["default"]',
    owned_badges          TEXT NOT NULL DEFAULT '[]',
    recent_matches        TEXT NOT NULL DEFAULT '[]',  -- JSON array, newest first
    sound_enabled         INTEGER NOT NULL DEFAULT 1,  -- boolean 0/1
    notifications_enabled INTEGER NOT NULL DEFAULT 1,  -- boolean 0/1
    name_changed_at       TEXT,                        -- RFC-3339, cooldown gate
    created_at            TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Login sessions (cookie tokens)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,     -- hex-encoded 32 random bytes
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

-- ----------------------------------------------------------------
-- Support tickets
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS support_tickets (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL,
    subject    TEXT NOT NULL,
    message    TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'open',
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_support_tickets_user ON support_tickets(user_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
