//! Login sessions addressed by opaque cookie tokens.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rusqlite::{params, OptionalExtension};

use quizarena_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::models::{encode_ts, now_utc, parse_user_id, Session};

const TOKEN_BYTES: usize = 32;

impl Database {
    /// Open a session for `user_id` valid for `ttl`, returning its token.
    pub fn create_session(&self, user_id: UserId, ttl: Duration) -> Result<Session> {
        let mut raw = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);

        let created_at = now_utc();
        let session = Session {
            token: hex::encode(raw),
            user_id,
            created_at,
            expires_at: created_at + ttl,
        };

        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id.to_string(),
                encode_ts(&session.created_at),
                encode_ts(&session.expires_at),
            ],
        )?;

        tracing::debug!(user = %user_id, "session opened");
        Ok(session)
    }

    /// Resolve a token to its owner if the session exists and has not
    /// expired at `now`.
    pub fn session_user(&self, token: &str, now: DateTime<Utc>) -> Result<Option<UserId>> {
        let user_id: Option<String> = self
            .conn()
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > ?2",
                params![token, encode_ts(&now)],
                |row| row.get(0),
            )
            .optional()?;

        match user_id {
            Some(id) => Ok(Some(parse_user_id(0, &id)?)),
            None => Ok(None),
        }
    }

    /// Delete a session. Unknown tokens are ignored.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    /// Remove all sessions that expired at or before `now`.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![encode_ts(&now)],
        )?;
        Ok(removed)
    }
}
