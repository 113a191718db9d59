use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use quizarena_shared::protocol::ErrorBody;
use quizarena_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("You can change your name again in {days_left} days")]
    Cooldown { days_left: i64 },

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Not authenticated".into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::Cooldown { .. } => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal(_) => ErrorBody {
                message: "Internal server error".to_string(),
                days_left: None,
            },
            ApiError::Cooldown { days_left } => ErrorBody {
                message: self.to_string(),
                days_left: Some(*days_left),
            },
            _ => ErrorBody {
                message: self.to_string(),
                days_left: None,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Not found".into()),
            StoreError::EmailTaken => ApiError::Conflict("Email already registered".into()),
            StoreError::AlreadyFriends => ApiError::Conflict("Already friends".into()),
            StoreError::DuplicatePending => {
                ApiError::Conflict("A friend request is already pending".into())
            }
            StoreError::InvalidRequest(msg) => ApiError::Validation(msg),
            other => {
                tracing::error!(error = %other, "storage failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn cooldown_carries_days_left() {
        let (status, body) = body_of(ApiError::Cooldown { days_left: 12 }).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["daysLeft"], 12);
    }

    #[tokio::test]
    async fn internal_errors_hide_the_cause() {
        let (status, body) = body_of(ApiError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("daysLeft").is_none());
    }

    #[test]
    fn store_conflicts_map_to_409() {
        for e in [
            StoreError::EmailTaken,
            StoreError::AlreadyFriends,
            StoreError::DuplicatePending,
        ] {
            assert_eq!(ApiError::from(e).status(), StatusCode::CONFLICT);
        }
        assert_eq!(
            ApiError::from(StoreError::Migration("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
