use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use quizarena_shared::protocol::{TicketEnvelope, TicketRequest, TicketsEnvelope};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;

pub async fn create_ticket(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<TicketRequest>,
) -> Result<(StatusCode, Json<TicketEnvelope>), ApiError> {
    if req.subject.trim().is_empty() || req.message.trim().is_empty() {
        return Err(ApiError::Validation("Subject and message are required".into()));
    }
    let ticket = state
        .db
        .lock()
        .await
        .create_ticket(auth.id, &req.subject, &req.message)?;
    Ok((StatusCode::CREATED, Json(TicketEnvelope { ticket })))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TicketsEnvelope>, ApiError> {
    let tickets = state.db.lock().await.list_tickets(auth.id)?;
    Ok(Json(TicketsEnvelope { tickets }))
}
