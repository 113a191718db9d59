//! Friend requests and the friendship graph.
//!
//! A request moves from `pending` to either `accepted` or `rejected` and is
//! kept afterwards as history. Friendships are stored as directed edges and
//! always written and removed in pairs.

use rusqlite::{params, OptionalExtension};

use quizarena_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{
    encode_ts, not_found, now_utc, parse_status, parse_ts, parse_user_id, FriendRequestStatus,
    FriendRequestView, FriendView, IncomingRequest, OutgoingRequest,
};
use crate::users::user_exists;

impl Database {
    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Create a pending request from `sender` to `receiver`.
    ///
    /// The self-request, existing-friendship and pending-either-way checks
    /// run inside the same write transaction as the insert.
    pub fn send_friend_request(
        &mut self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<FriendRequestView> {
        if sender == receiver {
            return Err(StoreError::InvalidRequest(
                "cannot send a friend request to yourself".into(),
            ));
        }

        let tx = self.write_tx()?;

        if !user_exists(&tx, receiver)? {
            return Err(StoreError::NotFound);
        }

        let (a, b) = (sender.to_string(), receiver.to_string());

        let friends: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM friendships
                 WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)
                 LIMIT 1",
                params![a, b],
                |row| row.get(0),
            )
            .optional()?;
        if friends.is_some() {
            return Err(StoreError::AlreadyFriends);
        }

        let pending: Option<i64> = tx
            .query_row(
                "SELECT id FROM friend_requests
                 WHERE status = 'pending'
                   AND ((sender_id = ?1 AND receiver_id = ?2)
                     OR (sender_id = ?2 AND receiver_id = ?1))
                 LIMIT 1",
                params![a, b],
                |row| row.get(0),
            )
            .optional()?;
        if pending.is_some() {
            return Err(StoreError::DuplicatePending);
        }

        let created_at = now_utc();
        tx.execute(
            "INSERT INTO friend_requests (sender_id, receiver_id, status, created_at)
             VALUES (?1, ?2, 'pending', ?3)",
            params![a, b, encode_ts(&created_at)],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(request = id, sender = %sender, receiver = %receiver, "friend request sent");

        Ok(FriendRequestView {
            id,
            sender_id: sender,
            receiver_id: receiver,
            status: FriendRequestStatus::Pending,
            created_at,
        })
    }

    pub fn get_friend_request(&self, id: i64) -> Result<FriendRequestView> {
        self.conn()
            .query_row(
                "SELECT id, sender_id, receiver_id, status, created_at
                 FROM friend_requests WHERE id = ?1",
                params![id],
                row_to_request,
            )
            .map_err(not_found)
    }

    /// Accept a pending request addressed to `acting_user` and create both
    /// friendship edges atomically.
    pub fn accept_friend_request(&mut self, id: i64, acting_user: UserId) -> Result<()> {
        let tx = self.write_tx()?;

        let sender: String = tx
            .query_row(
                "SELECT sender_id FROM friend_requests
                 WHERE id = ?1 AND receiver_id = ?2 AND status = 'pending'",
                params![id, acting_user.to_string()],
                |row| row.get(0),
            )
            .map_err(not_found)?;

        tx.execute(
            "UPDATE friend_requests SET status = 'accepted' WHERE id = ?1",
            params![id],
        )?;

        let receiver = acting_user.to_string();
        let now = encode_ts(&now_utc());
        for (owner, friend) in [(&sender, &receiver), (&receiver, &sender)] {
            tx.execute(
                "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![owner, friend, now],
            )?;
        }

        tx.commit()?;

        tracing::debug!(request = id, "friend request accepted");
        Ok(())
    }

    /// Reject a pending request addressed to `acting_user`.
    pub fn reject_friend_request(&self, id: i64, acting_user: UserId) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE friend_requests SET status = 'rejected'
             WHERE id = ?1 AND receiver_id = ?2 AND status = 'pending'",
            params![id, acting_user.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Pending requests addressed to `user`, newest first.
    pub fn list_incoming_requests(&self, user: UserId) -> Result<Vec<IncomingRequest>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.sender_id, r.status, r.created_at, u.name, u.xp, u.equipped_frame
             FROM friend_requests r
             JOIN users u ON u.id = r.sender_id
             WHERE r.receiver_id = ?1 AND r.status = 'pending'
             ORDER BY r.created_at DESC, r.id DESC",
        )?;

        let rows = stmt.query_map(params![user.to_string()], |row| {
            let sender: String = row.get(1)?;
            let status: String = row.get(2)?;
            let created_at: String = row.get(3)?;
            Ok(IncomingRequest {
                id: row.get(0)?,
                sender_id: parse_user_id(1, &sender)?,
                status: parse_status(2, &status)?,
                created_at: parse_ts(3, &created_at)?,
                sender_name: row.get(4)?,
                sender_xp: row.get(5)?,
                sender_frame: row.get(6)?,
            })
        })?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Pending requests sent by `user`, newest first.
    pub fn list_outgoing_requests(&self, user: UserId) -> Result<Vec<OutgoingRequest>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.receiver_id, r.status, r.created_at, u.name, u.xp
             FROM friend_requests r
             JOIN users u ON u.id = r.receiver_id
             WHERE r.sender_id = ?1 AND r.status = 'pending'
             ORDER BY r.created_at DESC, r.id DESC",
        )?;

        let rows = stmt.query_map(params![user.to_string()], |row| {
            let receiver: String = row.get(1)?;
            let status: String = row.get(2)?;
            let created_at: String = row.get(3)?;
            Ok(OutgoingRequest {
                id: row.get(0)?,
                receiver_id: parse_user_id(1, &receiver)?,
                status: parse_status(2, &status)?,
                created_at: parse_ts(3, &created_at)?,
                receiver_name: row.get(4)?,
                receiver_xp: row.get(5)?,
            })
        })?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    // ------------------------------------------------------------------
    // Friendships
    // ------------------------------------------------------------------

    /// Friends of `user` ordered by name.
    pub fn list_friends(&self, user: UserId) -> Result<Vec<FriendView>> {
        let mut stmt = self.conn().prepare(
            "SELECT u.id, u.name, u.xp, u.equipped_frame, u.games_played, u.wins
             FROM friendships f
             JOIN users u ON u.id = f.friend_id
             WHERE f.user_id = ?1
             ORDER BY u.name COLLATE NOCASE ASC",
        )?;

        let rows = stmt.query_map(params![user.to_string()], |row| {
            let id: String = row.get(0)?;
            Ok(FriendView {
                id: parse_user_id(0, &id)?,
                name: row.get(1)?,
                xp: row.get(2)?,
                equipped_frame: row.get(3)?,
                games_played: row.get(4)?,
                wins: row.get(5)?,
            })
        })?;

        let mut friends = Vec::new();
        for row in rows {
            friends.push(row?);
        }
        Ok(friends)
    }

    pub fn are_friends(&self, a: UserId, b: UserId) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
                params![a.to_string(), b.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Delete the friendship in both directions. Removing a non-friend is a
    /// no-op.
    pub fn remove_friend(&self, user: UserId, friend: UserId) -> Result<()> {
        let removed = self.conn().execute(
            "DELETE FROM friendships
             WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)",
            params![user.to_string(), friend.to_string()],
        )?;
        tracing::debug!(user = %user, friend = %friend, removed, "friendship removed");
        Ok(())
    }
}

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendRequestView> {
    let sender: String = row.get(1)?;
    let receiver: String = row.get(2)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(FriendRequestView {
        id: row.get(0)?,
        sender_id: parse_user_id(1, &sender)?,
        receiver_id: parse_user_id(2, &receiver)?,
        status: parse_status(3, &status)?,
        created_at: parse_ts(4, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, UserId, UserId) {
        let mut db = Database::open_in_memory().unwrap();
        let a = db.create_user("a@example.com", "h", "Ada").unwrap().id;
        let b = db.create_user("b@example.com", "h", "Ben").unwrap().id;
        (db, a, b)
    }

    fn count(db: &Database, sql: &str) -> i64 {
        db.conn().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn request_to_self_is_invalid() {
        let (mut db, a, _) = setup();
        assert!(matches!(
            db.send_friend_request(a, a),
            Err(StoreError::InvalidRequest(_))
        ));
    }

    #[test]
    fn request_to_unknown_user_is_not_found() {
        let (mut db, a, _) = setup();
        assert!(matches!(
            db.send_friend_request(a, UserId::new()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn duplicate_pending_either_direction() {
        let (mut db, a, b) = setup();
        let req = db.send_friend_request(a, b).unwrap();
        assert_eq!(req.status, FriendRequestStatus::Pending);

        assert!(matches!(
            db.send_friend_request(a, b),
            Err(StoreError::DuplicatePending)
        ));
        assert!(matches!(
            db.send_friend_request(b, a),
            Err(StoreError::DuplicatePending)
        ));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM friend_requests"), 1);
    }

    #[test]
    fn accept_creates_both_edges() {
        let (mut db, a, b) = setup();
        let req = db.send_friend_request(a, b).unwrap();

        // Only the receiver may accept.
        assert!(matches!(
            db.accept_friend_request(req.id, a),
            Err(StoreError::NotFound)
        ));

        db.accept_friend_request(req.id, b).unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM friendships"), 2);
        assert!(db.are_friends(a, b).unwrap());
        assert!(db.are_friends(b, a).unwrap());
        assert_eq!(
            db.get_friend_request(req.id).unwrap().status,
            FriendRequestStatus::Accepted
        );

        // A second accept finds no pending request.
        assert!(matches!(
            db.accept_friend_request(req.id, b),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            db.send_friend_request(b, a),
            Err(StoreError::AlreadyFriends)
        ));
        assert!(matches!(
            db.send_friend_request(a, b),
            Err(StoreError::AlreadyFriends)
        ));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM friend_requests"), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM friendships"), 2);
    }

    #[test]
    fn reject_creates_no_edges() {
        let (mut db, a, b) = setup();
        let req = db.send_friend_request(a, b).unwrap();

        assert!(matches!(
            db.reject_friend_request(req.id, a),
            Err(StoreError::NotFound)
        ));
        db.reject_friend_request(req.id, b).unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM friendships"), 0);
        assert_eq!(
            db.get_friend_request(req.id).unwrap().status,
            FriendRequestStatus::Rejected
        );

        // Rejected requests no longer block a new one.
        db.send_friend_request(b, a).unwrap();
    }

    #[test]
    fn remove_friend_is_idempotent() {
        let (mut db, a, b) = setup();
        let req = db.send_friend_request(a, b).unwrap();
        db.accept_friend_request(req.id, b).unwrap();

        db.remove_friend(a, b).unwrap();
        assert_eq!(count(&db, "SELECT COUNT(*) FROM friendships"), 0);
        db.remove_friend(a, b).unwrap();
        db.remove_friend(b, a).unwrap();
        assert!(db.list_friends(a).unwrap().is_empty());
    }

    #[test]
    fn listings_join_counterpart_details() {
        let (mut db, a, b) = setup();
        let c = db.create_user("c@example.com", "h", "Cy").unwrap().id;

        db.send_friend_request(a, b).unwrap();
        let req = db.send_friend_request(c, a).unwrap();

        let outgoing = db.list_outgoing_requests(a).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].receiver_name, "Ben");

        let incoming = db.list_incoming_requests(a).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].sender_id, c);
        assert_eq!(incoming[0].sender_name, "Cy");
        assert_eq!(incoming[0].sender_frame, "default");

        db.accept_friend_request(req.id, a).unwrap();
        assert!(db.list_incoming_requests(a).unwrap().is_empty());

        let friends = db.list_friends(a).unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, c);
        assert_eq!(friends[0].games_played, 0);
    }
}
