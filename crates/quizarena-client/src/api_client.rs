//! Typed wrapper over the backend's REST API.
//!
//! The underlying `reqwest::Client` keeps a cookie jar, so a successful
//! `register` or `login` authenticates every later call on the same
//! [`ApiClient`] (and its clones).

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quizarena_shared::protocol::{
    ChangeNameRequest, ErrorBody, FriendRequestEnvelope, FriendRequestView, FriendView,
    FriendsEnvelope, IncomingRequest, LoginRequest, MessageBody, OutgoingRequest, ProfileUpdate,
    RegisterRequest, RequestsEnvelope, SendFriendRequest, TicketEnvelope, TicketRequest,
    TicketView, TicketsEnvelope, UserEnvelope, UserSummary, UserView, UsersEnvelope,
};
use quizarena_shared::types::UserId;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub name: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Confirmation gate
// ---------------------------------------------------------------------------

/// A friend removal that still needs the user's explicit confirmation.
#[derive(Debug, Clone)]
pub struct PendingRemoval {
    friend: UserId,
    name: String,
}

impl PendingRemoval {
    pub fn new(friend: &FriendView) -> Self {
        Self {
            friend: friend.id,
            name: friend.name.clone(),
        }
    }

    /// Text for the confirmation dialog.
    pub fn prompt(&self) -> String {
        format!("Remove {} from your friends?", self.name)
    }

    /// Record that the user agreed.
    pub fn confirm(self) -> Confirmed {
        Confirmed {
            friend: self.friend,
        }
    }
}

/// Proof that the user confirmed a removal. Only obtainable through
/// [`PendingRemoval::confirm`].
#[derive(Debug)]
pub struct Confirmed {
    friend: UserId,
}

impl Confirmed {
    pub fn friend(&self) -> UserId {
        self.friend
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("quizarena-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health(&self) -> Result<Health> {
        self.send(self.request(Method::GET, "/health")).await
    }

    // -- Accounts ----------------------------------------------------------

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<UserView> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let env: UserEnvelope = self
            .send(self.request(Method::POST, "/api/auth/register").json(&body))
            .await?;
        info!(user = %env.user.id, "registered");
        Ok(env.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserView> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let env: UserEnvelope = self
            .send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;
        info!(user = %env.user.id, "logged in");
        Ok(env.user)
    }

    pub async fn me(&self) -> Result<UserView> {
        let env: UserEnvelope = self.send(self.request(Method::GET, "/api/auth/me")).await?;
        Ok(env.user)
    }

    pub async fn logout(&self) -> Result<()> {
        let _: MessageBody = self
            .send(self.request(Method::POST, "/api/auth/logout"))
            .await?;
        Ok(())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserView> {
        let env: UserEnvelope = self
            .send(self.request(Method::PUT, "/api/user/profile").json(update))
            .await?;
        Ok(env.user)
    }

    pub async fn change_name(&self, name: &str) -> Result<UserView> {
        let body = ChangeNameRequest {
            name: name.to_string(),
        };
        let env: UserEnvelope = self
            .send(self.request(Method::PUT, "/api/user/change-name").json(&body))
            .await?;
        Ok(env.user)
    }

    // -- Friends -----------------------------------------------------------

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>> {
        let env: UsersEnvelope = self
            .send(
                self.request(Method::GET, "/api/friends/search")
                    .query(&[("q", query)]),
            )
            .await?;
        Ok(env.users)
    }

    pub async fn send_friend_request(&self, friend: UserId) -> Result<FriendRequestView> {
        let body = SendFriendRequest { friend_id: friend };
        let env: FriendRequestEnvelope = self
            .send(self.request(Method::POST, "/api/friends/request").json(&body))
            .await?;
        Ok(env.request)
    }

    pub async fn incoming_requests(&self) -> Result<Vec<IncomingRequest>> {
        let env: RequestsEnvelope<IncomingRequest> = self
            .send(self.request(Method::GET, "/api/friends/requests/incoming"))
            .await?;
        Ok(env.requests)
    }

    pub async fn outgoing_requests(&self) -> Result<Vec<OutgoingRequest>> {
        let env: RequestsEnvelope<OutgoingRequest> = self
            .send(self.request(Method::GET, "/api/friends/requests/outgoing"))
            .await?;
        Ok(env.requests)
    }

    pub async fn accept_request(&self, id: i64) -> Result<()> {
        let path = format!("/api/friends/request/{id}/accept");
        let _: MessageBody = self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    pub async fn reject_request(&self, id: i64) -> Result<()> {
        let path = format!("/api/friends/request/{id}/reject");
        let _: MessageBody = self.send(self.request(Method::POST, &path)).await?;
        Ok(())
    }

    pub async fn friends(&self) -> Result<Vec<FriendView>> {
        let env: FriendsEnvelope = self.send(self.request(Method::GET, "/api/friends")).await?;
        Ok(env.friends)
    }

    /// Remove a friend. Requires a [`Confirmed`] token from the
    /// confirmation step.
    pub async fn remove_friend(&self, confirmed: Confirmed) -> Result<()> {
        let path = format!("/api/friends/{}", confirmed.friend());
        let _: MessageBody = self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    // -- Support -----------------------------------------------------------

    pub async fn create_ticket(&self, subject: &str, message: &str) -> Result<TicketView> {
        let body = TicketRequest {
            subject: subject.to_string(),
            message: message.to_string(),
        };
        let env: TicketEnvelope = self
            .send(self.request(Method::POST, "/api/support/ticket").json(&body))
            .await?;
        Ok(env.ticket)
    }

    pub async fn tickets(&self) -> Result<Vec<TicketView>> {
        let env: TicketsEnvelope = self
            .send(self.request(Method::GET, "/api/support/tickets"))
            .await?;
        Ok(env.tickets)
    }

    // -- Plumbing ----------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.config.url(path))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!(status = status.as_u16(), url = %resp.url(), "api response");

        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let body = resp.json::<ErrorBody>().await.ok();
        Err(error_from_status(status, body))
    }
}

/// Translate a non-2xx response into the client's error taxonomy.
pub fn error_from_status(status: StatusCode, body: Option<ErrorBody>) -> ClientError {
    let (message, days_left) = match body {
        Some(body) => (body.message, body.days_left),
        None => (
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            None,
        ),
    };

    match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN if days_left.is_some() => ClientError::Conflict { message, days_left },
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::CONFLICT => ClientError::Conflict {
            message,
            days_left: None,
        },
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
        other => ClientError::Server {
            status: other.as_u16(),
            message,
        },
    }
}
