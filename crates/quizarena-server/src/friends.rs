//! Friend search, requests and the friend list.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use quizarena_shared::constants::SEARCH_MAX_RESULTS;
use quizarena_shared::protocol::{
    FriendRequestEnvelope, FriendsEnvelope, IncomingRequest, MessageBody, OutgoingRequest,
    RequestsEnvelope, SendFriendRequest, UsersEnvelope,
};
use quizarena_shared::types::UserId;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<UsersEnvelope>, ApiError> {
    let users = state
        .db
        .lock()
        .await
        .search_users(&params.q, auth.id, SEARCH_MAX_RESULTS)?;
    Ok(Json(UsersEnvelope { users }))
}

pub async fn send_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<SendFriendRequest>,
) -> Result<(StatusCode, Json<FriendRequestEnvelope>), ApiError> {
    let request = state
        .db
        .lock()
        .await
        .send_friend_request(auth.id, req.friend_id)
        .map_err(|e| match e {
            quizarena_store::StoreError::NotFound => ApiError::NotFound("User not found".into()),
            other => other.into(),
        })?;
    Ok((StatusCode::CREATED, Json(FriendRequestEnvelope { request })))
}

pub async fn incoming(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<RequestsEnvelope<IncomingRequest>>, ApiError> {
    let requests = state.db.lock().await.list_incoming_requests(auth.id)?;
    Ok(Json(RequestsEnvelope { requests }))
}

pub async fn outgoing(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<RequestsEnvelope<OutgoingRequest>>, ApiError> {
    let requests = state.db.lock().await.list_outgoing_requests(auth.id)?;
    Ok(Json(RequestsEnvelope { requests }))
}

pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageBody>, ApiError> {
    state
        .db
        .lock()
        .await
        .accept_friend_request(id, auth.id)
        .map_err(request_not_found)?;
    Ok(Json(MessageBody {
        message: "Friend request accepted".into(),
    }))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageBody>, ApiError> {
    state
        .db
        .lock()
        .await
        .reject_friend_request(id, auth.id)
        .map_err(request_not_found)?;
    Ok(Json(MessageBody {
        message: "Friend request rejected".into(),
    }))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<FriendsEnvelope>, ApiError> {
    let friends = state.db.lock().await.list_friends(auth.id)?;
    Ok(Json(FriendsEnvelope { friends }))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(friend): ApiPath<UserId>,
) -> Result<Json<MessageBody>, ApiError> {
    state.db.lock().await.remove_friend(auth.id, friend)?;
    Ok(Json(MessageBody {
        message: "Friend removed".into(),
    }))
}

fn request_not_found(e: quizarena_store::StoreError) -> ApiError {
    match e {
        quizarena_store::StoreError::NotFound => {
            ApiError::NotFound("Friend request not found".into())
        }
        other => other.into(),
    }
}
