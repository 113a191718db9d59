//! Registration, login, session and profile endpoints.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use tracing::info;

use quizarena_shared::constants::{
    NAME_CHANGE_COOLDOWN_DAYS, NAME_MAX_LEN, NAME_MIN_LEN, PASSWORD_MIN_LEN,
};
use quizarena_shared::protocol::{
    ChangeNameRequest, LoginRequest, MessageBody, ProfileUpdate, RegisterRequest, UserEnvelope,
};

use crate::api::AppState;
use crate::auth::{
    clear_session_cookie, hash_password, session_cookie, session_token, verify_password, AuthUser,
};
use crate::error::ApiError;
use crate::extract::ApiJson;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.config.registration_open {
        return Err(ApiError::Forbidden("Registration is closed".into()));
    }

    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() || req.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Email, password and name are required".into(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    if req.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    let name = validate_name(&req.name)?;

    let password_hash = hash_password(state.hasher.clone(), req.password.clone()).await?;

    let (user, session) = {
        let mut db = state.db.lock().await;
        let user = db.create_user(&email, &password_hash, &name)?;
        let session = db.create_session(user.id, state.config.session_ttl())?;
        (user, session)
    };

    info!(user = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie_for(&state, &session.token))],
        Json(UserEnvelope {
            user: user.to_view(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required".into()));
    }

    let user = {
        let db = state.db.lock().await;
        db.find_user_by_email(&req.email)?
    };

    // Unknown email and wrong password share one message and one hash cost.
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_password(state.hasher.clone(), req.password.clone(), stored).await?;
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(ApiError::Unauthorized("Invalid email or password".into())),
    };

    let session = {
        let db = state.db.lock().await;
        db.create_session(user.id, state.config.session_ttl())?
    };

    info!(user = %user.id, "login");

    Ok((
        [(SET_COOKIE, cookie_for(&state, &session.token))],
        Json(UserEnvelope {
            user: user.to_view(),
        }),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserEnvelope>, ApiError> {
    let db = state.db.lock().await;
    let user = db.get_user(auth.id).map_err(|e| match e {
        quizarena_store::StoreError::NotFound => ApiError::unauthorized(),
        other => other.into(),
    })?;
    Ok(Json(UserEnvelope {
        user: user.to_view(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state.db.lock().await.delete_session(&token)?;
    }

    Ok((
        [(SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
        Json(MessageBody {
            message: "Logged out".into(),
        }),
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state.db.lock().await.update_profile(auth.id, &update)?;
    tracing::debug!(user = %auth.id, xp = user.xp, coins = user.coins, "profile synced");
    Ok(Json(UserEnvelope {
        user: user.to_view(),
    }))
}

pub async fn change_name(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<ChangeNameRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let name = validate_name(&req.name)?;
    let now = Utc::now();

    let db = state.db.lock().await;
    let current = db.get_user(auth.id)?;

    if let Some(days_left) = name_change_days_left(current.name_changed_at, now) {
        return Err(ApiError::Cooldown { days_left });
    }

    let user = db.rename_user(auth.id, &name, now)?;
    info!(user = %auth.id, "display name changed");

    Ok(Json(UserEnvelope {
        user: user.to_view(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cookie_for(state: &AppState, token: &str) -> String {
    session_cookie(
        token,
        state.config.session_ttl().num_seconds(),
        state.config.cookie_secure,
    )
}

/// Trim a display name and check its length bounds.
pub fn validate_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(ApiError::Validation(format!(
            "Name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Whole days until another rename is allowed, or `None` when it is
/// allowed now.
pub fn name_change_days_left(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let last = last?;
    let days_since = (now - last).num_milliseconds() as f64 / MILLIS_PER_DAY;
    let cooldown = NAME_CHANGE_COOLDOWN_DAYS as f64;
    if days_since < cooldown {
        Some((cooldown - days_since).ceil() as i64)
    } else {
        None
    }
}
