//! # quizarena-store
//!
//! Relational storage for the Quiz Arena backend, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for accounts, login
//! sessions, the friendship graph and support tickets. Operations that must
//! be atomic (friend requests, accepting a request, profile updates) run in
//! a single immediate transaction.

pub mod database;
pub mod friends;
pub mod migrations;
pub mod models;
pub mod sessions;
pub mod tickets;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
