//! Support tickets filed by users.

use rusqlite::params;

use quizarena_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{encode_ts, now_utc, parse_ts, parse_user_id, TicketView};

pub const STATUS_OPEN: &str = "open";

impl Database {
    pub fn create_ticket(&self, user: UserId, subject: &str, message: &str) -> Result<TicketView> {
        if subject.trim().is_empty() || message.trim().is_empty() {
            return Err(StoreError::InvalidRequest(
                "subject and message are required".into(),
            ));
        }

        let created_at = now_utc();
        self.conn().execute(
            "INSERT INTO support_tickets (user_id, subject, message, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.to_string(),
                subject.trim(),
                message.trim(),
                STATUS_OPEN,
                encode_ts(&created_at)
            ],
        )?;

        let ticket = TicketView {
            id: self.conn().last_insert_rowid(),
            user_id: user,
            subject: subject.trim().to_string(),
            message: message.trim().to_string(),
            status: STATUS_OPEN.to_string(),
            created_at,
        };

        tracing::info!(ticket = ticket.id, user = %user, "support ticket filed");
        Ok(ticket)
    }

    /// The tickets filed by `user`, newest first.
    pub fn list_tickets(&self, user: UserId) -> Result<Vec<TicketView>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, subject, message, status, created_at
             FROM support_tickets
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![user.to_string()], |row| {
            let user_id: String = row.get(1)?;
            let created_at: String = row.get(5)?;
            Ok(TicketView {
                id: row.get(0)?,
                user_id: parse_user_id(1, &user_id)?,
                subject: row.get(2)?,
                message: row.get(3)?,
                status: row.get(4)?,
                created_at: parse_ts(5, &created_at)?,
            })
        })?;

        let mut tickets = Vec::new();
        for row in rows {
            tickets.push(row?);
        }
        Ok(tickets)
    }
}
