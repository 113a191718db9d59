//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use quizarena_shared::constants::{RECENT_MATCHES_CAP, SEARCH_MIN_QUERY_LEN, STARTING_COINS};
use quizarena_shared::lifeline::starting_lifelines;
use quizarena_shared::protocol::{ProfileUpdate, UserSummary};
use quizarena_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    encode_ts, not_found, now_utc, parse_json, parse_ts, parse_user_id, User,
};

const USER_COLUMNS: &str = "id, email, password_hash, name, xp, coins, wins, losses, \
     games_played, streak, lifelines, equipped_frame, equipped_theme, owned_frames, \
     owned_themes, owned_badges, recent_matches, sound_enabled, notifications_enabled, \
     name_changed_at, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new account with signup defaults. The email is trimmed and
    /// lower-cased before the uniqueness check.
    pub fn create_user(&mut self, email: &str, password_hash: &str, name: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let user = User {
            id: UserId::new(),
            email,
            password_hash: password_hash.to_string(),
            name: name.trim().to_string(),
            xp: 0,
            coins: STARTING_COINS,
            wins: 0,
            losses: 0,
            games_played: 0,
            streak: 0,
            lifelines: starting_lifelines(),
            equipped_frame: "default".to_string(),
            equipped_theme: "default".to_string(),
            owned_frames: vec!["default".to_string()],
            owned_themes: vec!["default".to_string()],
            owned_badges: Vec::new(),
            recent_matches: Vec::new(),
            sound_enabled: true,
            notifications_enabled: true,
            name_changed_at: None,
            created_at: now_utc(),
        };

        let tx = self.write_tx()?;

        let taken: Option<String> = tx
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![user.email],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(StoreError::EmailTaken);
        }

        tx.execute(
            "INSERT INTO users (id, email, password_hash, name, xp, coins, wins, losses,
                 games_played, streak, lifelines, equipped_frame, equipped_theme, owned_frames,
                 owned_themes, owned_badges, recent_matches, sound_enabled,
                 notifications_enabled, name_changed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18, ?19, ?20, ?21)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.name,
                user.xp,
                user.coins,
                user.wins,
                user.losses,
                user.games_played,
                user.streak,
                serde_json::to_string(&user.lifelines)?,
                user.equipped_frame,
                user.equipped_theme,
                serde_json::to_string(&user.owned_frames)?,
                serde_json::to_string(&user.owned_themes)?,
                serde_json::to_string(&user.owned_badges)?,
                serde_json::to_string(&user.recent_matches)?,
                user.sound_enabled,
                user.notifications_enabled,
                user.name_changed_at.as_ref().map(encode_ts),
                encode_ts(&user.created_at),
            ],
        )
        .map_err(|e| match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::EmailTaken,
            _ => StoreError::Sqlite(e),
        })?;

        tx.commit()?;

        tracing::debug!(user = %user.id, "user created");
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user(&self, id: UserId) -> Result<User> {
        load_user(self.conn(), id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![email.trim().to_lowercase()], row_to_user)
            .optional()?)
    }

    pub fn user_exists(&self, id: UserId) -> Result<bool> {
        user_exists(self.conn(), id)
    }

    /// Case-insensitive substring search over name and email.
    ///
    /// Queries shorter than two characters (after trimming) return nothing.
    /// The requester is never part of the result.
    pub fn search_users(
        &self,
        query: &str,
        exclude: UserId,
        limit: usize,
    ) -> Result<Vec<UserSummary>> {
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", escape_like(query));

        let mut stmt = self.conn().prepare(
            "SELECT id, name, xp, equipped_frame
             FROM users
             WHERE id <> ?1
               AND (name LIKE ?2 ESCAPE '\\' OR email LIKE ?2 ESCAPE '\\')
             ORDER BY name COLLATE NOCASE ASC
             LIMIT ?3",
        )?;

        let rows = stmt.query_map(
            params![exclude.to_string(), pattern, limit as i64],
            |row| {
                let id: String = row.get(0)?;
                Ok(UserSummary {
                    id: parse_user_id(0, &id)?,
                    name: row.get(1)?,
                    xp: row.get(2)?,
                    equipped_frame: row.get(3)?,
                })
            },
        )?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial profile update as one read-modify-write.
    ///
    /// Rejects updates that would leave `games_played < wins + losses`.
    /// Match history is cut to the newest ten entries.
    pub fn update_profile(&mut self, id: UserId, update: &ProfileUpdate) -> Result<User> {
        let tx = self.write_tx()?;
        let mut user = load_user(&tx, id)?;

        apply_update(&mut user, update);

        if (user.wins as u64 + user.losses as u64) > user.games_played as u64 {
            return Err(StoreError::InvalidRequest(format!(
                "gamesPlayed ({}) must be at least wins + losses ({})",
                user.games_played,
                user.wins as u64 + user.losses as u64
            )));
        }

        tx.execute(
            "UPDATE users SET xp = ?2, coins = ?3, wins = ?4, losses = ?5, games_played = ?6,
                 streak = ?7, lifelines = ?8, equipped_frame = ?9, equipped_theme = ?10,
                 owned_frames = ?11, owned_themes = ?12, owned_badges = ?13,
                 recent_matches = ?14, sound_enabled = ?15, notifications_enabled = ?16
             WHERE id = ?1",
            params![
                user.id.to_string(),
                user.xp,
                user.coins,
                user.wins,
                user.losses,
                user.games_played,
                user.streak,
                serde_json::to_string(&user.lifelines)?,
                user.equipped_frame,
                user.equipped_theme,
                serde_json::to_string(&user.owned_frames)?,
                serde_json::to_string(&user.owned_themes)?,
                serde_json::to_string(&user.owned_badges)?,
                serde_json::to_string(&user.recent_matches)?,
                user.sound_enabled,
                user.notifications_enabled,
            ],
        )?;
        tx.commit()?;

        Ok(user)
    }

    /// Set a new display name and stamp the change time.
    pub fn rename_user(&self, id: UserId, name: &str, at: DateTime<Utc>) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET name = ?2, name_changed_at = ?3 WHERE id = ?1",
            params![id.to_string(), name, encode_ts(&at)],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn apply_update(user: &mut User, update: &ProfileUpdate) {
    if let Some(v) = update.xp {
        user.xp = v;
    }
    if let Some(v) = update.coins {
        user.coins = v;
    }
    if let Some(v) = update.wins {
        user.wins = v;
    }
    if let Some(v) = update.losses {
        user.losses = v;
    }
    if let Some(v) = update.games_played {
        user.games_played = v;
    }
    if let Some(v) = update.streak {
        user.streak = v;
    }
    if let Some(v) = &update.lifelines {
        user.lifelines = v.clone();
    }
    if let Some(v) = &update.recent_matches {
        user.recent_matches = v.iter().take(RECENT_MATCHES_CAP).cloned().collect();
    }
    if let Some(v) = &update.equipped_frame {
        user.equipped_frame = v.clone();
    }
    if let Some(v) = &update.equipped_theme {
        user.equipped_theme = v.clone();
    }
    if let Some(v) = &update.owned_frames {
        user.owned_frames = v.clone();
    }
    if let Some(v) = &update.owned_themes {
        user.owned_themes = v.clone();
    }
    if let Some(v) = &update.owned_badges {
        user.owned_badges = v.clone();
    }
    if let Some(v) = update.sound_enabled {
        user.sound_enabled = v;
    }
    if let Some(v) = update.notifications_enabled {
        user.notifications_enabled = v;
    }
}

pub(crate) fn load_user(conn: &Connection, id: UserId) -> Result<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], row_to_user)
        .map_err(not_found)
}

pub(crate) fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Map a `rusqlite::Row` selected with [`USER_COLUMNS`] to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let lifelines: String = row.get(10)?;
    let owned_frames: String = row.get(13)?;
    let owned_themes: String = row.get(14)?;
    let owned_badges: String = row.get(15)?;
    let recent_matches: String = row.get(16)?;
    let name_changed_at: Option<String> = row.get(19)?;
    let created_at: String = row.get(20)?;

    Ok(User {
        id: parse_user_id(0, &id)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        xp: row.get(4)?,
        coins: row.get(5)?,
        wins: row.get(6)?,
        losses: row.get(7)?,
        games_played: row.get(8)?,
        streak: row.get(9)?,
        lifelines: parse_json(10, &lifelines)?,
        equipped_frame: row.get(11)?,
        equipped_theme: row.get(12)?,
        owned_frames: parse_json(13, &owned_frames)?,
        owned_themes: parse_json(14, &owned_themes)?,
        owned_badges: parse_json(15, &owned_badges)?,
        recent_matches: parse_json(16, &recent_matches)?,
        sound_enabled: row.get(17)?,
        notifications_enabled: row.get(18)?,
        name_changed_at: name_changed_at.map(|s| parse_ts(19, &s)).transpose()?,
        created_at: parse_ts(20, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizarena_shared::lifeline::LifelineKind;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn create_applies_signup_defaults() {
        let mut db = db();
        let user = db.create_user("  Alice@Example.com ", "hash", "Alice").unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.coins, STARTING_COINS);
        assert_eq!(user.lifelines.get(&LifelineKind::FiftyFifty), Some(&2));

        let loaded = db.get_user(user.id).unwrap();
        assert_eq!(loaded, user);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut db = db();
        db.create_user("bob@example.com", "h", "Bob").unwrap();
        let err = db.create_user("BOB@example.com", "h", "Bobby").unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[test]
    fn find_by_email_is_case_insensitive() {
        let mut db = db();
        let user = db.create_user("carol@example.com", "h", "Carol").unwrap();
        let found = db.find_user_by_email("Carol@Example.COM").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(db.find_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn missing_user_is_not_found() {
        let db = db();
        assert!(matches!(db.get_user(UserId::new()), Err(StoreError::NotFound)));
    }

    #[test]
    fn search_matches_name_or_email_and_excludes_self() {
        let mut db = db();
        let me = db.create_user("me@example.com", "h", "Samir").unwrap();
        db.create_user("sam@example.com", "h", "Other").unwrap();
        db.create_user("x@example.com", "h", "SAMANTHA").unwrap();
        db.create_user("y@example.com", "h", "Zed").unwrap();

        let hits = db.search_users("sam", me.id, 20).unwrap();
        let names: Vec<_> = hits.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Other", "SAMANTHA"]);

        assert!(db.search_users(" s ", me.id, 20).unwrap().is_empty());
    }

    #[test]
    fn search_is_capped() {
        let mut db = db();
        let me = db.create_user("me@example.com", "h", "Me").unwrap();
        for i in 0..25 {
            db.create_user(&format!("player{i}@example.com"), "h", &format!("Player {i}"))
                .unwrap();
        }
        assert_eq!(db.search_users("player", me.id, 20).unwrap().len(), 20);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let mut db = db();
        let me = db.create_user("me@example.com", "h", "Me").unwrap();
        db.create_user("a@example.com", "h", "Plain").unwrap();
        db.create_user("b@example.com", "h", "100% Sure").unwrap();

        let hits = db.search_users("0%", me.id, 20).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "100% Sure");
    }

    #[test]
    fn update_profile_is_partial() {
        let mut db = db();
        let user = db.create_user("d@example.com", "h", "Dana").unwrap();

        let update = ProfileUpdate {
            xp: Some(450),
            games_played: Some(3),
            wins: Some(2),
            equipped_frame: Some("frame_gold".into()),
            ..Default::default()
        };
        let updated = db.update_profile(user.id, &update).unwrap();

        assert_eq!(updated.xp, 450);
        assert_eq!(updated.coins, user.coins);
        assert_eq!(updated.equipped_frame, "frame_gold");
        assert_eq!(db.get_user(user.id).unwrap(), updated);
    }

    #[test]
    fn update_profile_rejects_impossible_counters() {
        let mut db = db();
        let user = db.create_user("e@example.com", "h", "Eve").unwrap();
        let update = ProfileUpdate {
            wins: Some(5),
            ..Default::default()
        };
        let err = db.update_profile(user.id, &update).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
        assert_eq!(db.get_user(user.id).unwrap().wins, 0);
    }

    #[test]
    fn rename_stamps_change_time() {
        let mut db = db();
        let user = db.create_user("f@example.com", "h", "Fay").unwrap();
        let at = Utc::now();
        let renamed = db.rename_user(user.id, "Faye", at).unwrap();
        assert_eq!(renamed.name, "Faye");
        assert!(renamed.name_changed_at.is_some());

        assert!(matches!(
            db.rename_user(UserId::new(), "Ghost", at),
            Err(StoreError::NotFound)
        ));
    }
}
