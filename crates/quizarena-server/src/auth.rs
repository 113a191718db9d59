//! Password hashing, the session cookie and the authenticated-user
//! extractor.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::Utc;
use rand::RngCore;

use quizarena_shared::constants::SESSION_COOKIE;
use quizarena_shared::types::UserId;

use crate::api::AppState;
use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Turns plaintext passwords into stored hashes and checks them back.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, ApiError>;
    fn verify(&self, password: &str, stored: &str) -> bool;

    /// A valid hash of no real password. Logins for unknown emails verify
    /// against it so they cost the same as logins for known ones.
    fn dummy_hash(&self) -> &str;
}

/// Argon2id with PHC-string storage (`$argon2id$v=19$m=...`).
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    dummy: String,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Result<Self, ApiError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut hasher = Self {
            argon2,
            dummy: String::new(),
        };
        let mut filler = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut filler);
        hasher.dummy = hasher.hash(&hex::encode(filler))?;
        Ok(hasher)
    }

    /// The argon2 crate's recommended cost (19 MiB, 2 passes).
    pub fn recommended() -> Result<Self, ApiError> {
        Self::new(Params::default())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn dummy_hash(&self) -> &str {
        &self.dummy
    }
}

/// Minimum argon2 cost so tests stay fast.
#[cfg(test)]
pub(crate) fn cheap_hasher() -> Argon2Hasher {
    Argon2Hasher::new(Params::new(8, 1, 1, None).unwrap()).unwrap()
}

/// Hash on the blocking pool; argon2 is deliberately slow.
pub async fn hash_password(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
}

/// Check `password` against `stored`, or against the dummy hash when there
/// is no account, on the blocking pool.
pub async fn verify_password(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
    stored: Option<String>,
) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || match stored {
        Some(stored) => hasher.verify(&password, &stored),
        None => {
            hasher.verify(&password, hasher.dummy_hash());
            false
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("verify task failed: {e}")))
}

// ---------------------------------------------------------------------------
// Session cookie
// ---------------------------------------------------------------------------

/// `Set-Cookie` value that installs a session token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Find the session token among the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// The caller behind a valid, unexpired session cookie.
///
/// Rejects with 401 before the handler runs, so handlers never learn
/// anything about unauthenticated callers' targets.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = session_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;

        let user = {
            let db = state.db.lock().await;
            db.session_user(&token, Utc::now())?
        };

        match user {
            Some(id) => Ok(AuthUser { id, token }),
            None => Err(ApiError::unauthorized()),
        }
    }
}
