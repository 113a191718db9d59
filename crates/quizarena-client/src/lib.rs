//! # quizarena-client
//!
//! The client-resident half of Quiz Arena: the profile task that owns the
//! player's progression, its local cache and background sync, the REST
//! client for the backend, and the match engine with its simulated
//! opponents and cancellable timers.

pub mod api_client;
pub mod bank;
pub mod cache;
pub mod config;
pub mod error;
pub mod game;
pub mod profile;
pub mod scheduler;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

pub use api_client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use game::{start_match, MatchConfig, MatchHandle};
pub use profile::{ProfileHandle, ProfileTask};
pub use scheduler::{Scheduler, SessionId};
pub use state::AppState;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quizarena_client=debug"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .try_init();
}
