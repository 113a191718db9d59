use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::Method,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use quizarena_store::Database;

use crate::auth::PasswordHasher;
use crate::config::ServerConfig;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::{account, friends, support};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Credential endpoints sit behind the per-IP token bucket.
    let credentials = Router::new()
        .route("/api/auth/register", post(account::register))
        .route("/api/auth/login", post(account::login))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/me", get(account::me))
        .route("/api/auth/logout", post(account::logout))
        .route("/api/user/profile", put(account::update_profile))
        .route("/api/user/change-name", put(account::change_name))
        .route("/api/friends", get(friends::list))
        .route("/api/friends/search", get(friends::search))
        .route("/api/friends/request", post(friends::send_request))
        .route("/api/friends/requests/incoming", get(friends::incoming))
        .route("/api/friends/requests/outgoing", get(friends::outgoing))
        .route("/api/friends/request/:id/accept", post(friends::accept))
        .route("/api/friends/request/:id/reject", post(friends::reject))
        .route("/api/friends/:friend_id", delete(friends::remove))
        .route("/api/support/ticket", post(support::create_ticket))
        .route("/api/support/tickets", get(support::list_tickets))
        .merge(credentials)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    name: String,
    version: &'static str,
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "HTTP API server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::cheap_hasher;

    fn test_state(config: ServerConfig) -> AppState {
        AppState {
            db: Arc::new(Mutex::new(Database::open_in_memory().unwrap())),
            hasher: Arc::new(cheap_hasher()),
            rate_limiter: RateLimiter::from_config(&config),
            config: Arc::new(config),
        }
    }

    struct Reply {
        status: StatusCode,
        cookie: Option<String>,
        body: Value,
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = cookie {
            req = req.header(header::COOKIE, format!("qa_session={token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .and_then(|v| v.strip_prefix("qa_session="))
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            cookie,
            body,
        }
    }

    /// Register an account and return (session token, user id).
    async fn signup(app: &Router, email: &str, name: &str) -> (String, String) {
        let reply = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "secret1", "name": name })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let id = reply.body["user"]["id"].as_str().unwrap().to_string();
        (reply.cookie.unwrap(), id)
    }

    #[tokio::test]
    async fn health_reports_instance() {
        let app = build_router(test_state(ServerConfig::default()));
        let reply = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["status"], "ok");
        assert_eq!(reply.body["name"], "Quiz Arena");
    }

    #[tokio::test]
    async fn register_login_me_logout() {
        let app = build_router(test_state(ServerConfig::default()));

        let reply = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "Ann@Example.com", "password": "secret1", "name": "Ann" })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let user = &reply.body["user"];
        assert_eq!(user["email"], "ann@example.com");
        assert_eq!(user["coins"], 500);
        assert_eq!(user["lifelines"]["fifty_fifty"], 2);
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password_hash").is_none());

        let duplicate = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ann@example.com", "password": "secret1", "name": "Ann" })),
        )
        .await;
        assert_eq!(duplicate.status, StatusCode::CONFLICT);

        let wrong = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": "nope!!" })),
        )
        .await;
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
        let unknown = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "who@example.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.body["message"], unknown.body["message"]);

        let login = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(login.status, StatusCode::OK);
        let token = login.cookie.unwrap();

        let me = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.body["user"]["name"], "Ann");

        let logout = call(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
        assert_eq!(logout.status, StatusCode::OK);

        let me = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = build_router(test_state(ServerConfig::default()));
        let short = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "a@example.com", "password": "12345", "name": "Al" })),
        )
        .await;
        assert_eq!(short.status, StatusCode::BAD_REQUEST);

        let missing = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "", "password": "123456", "name": "Al" })),
        )
        .await;
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn closed_registration_is_forbidden() {
        let config = ServerConfig {
            registration_open: false,
            ..ServerConfig::default()
        };
        let app = build_router(test_state(config));
        let reply = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "a@example.com", "password": "123456", "name": "Al" })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn protected_routes_require_session() {
        let app = build_router(test_state(ServerConfig::default()));
        for (method, uri) in [
            (Method::GET, "/api/auth/me"),
            (Method::GET, "/api/friends"),
            (Method::GET, "/api/friends/search?q=ann"),
            (Method::GET, "/api/friends/requests/incoming"),
            (Method::POST, "/api/friends/request/1/accept"),
            (Method::GET, "/api/support/tickets"),
        ] {
            let reply = call(&app, method, uri, Some("bogus"), None).await;
            assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn profile_update_and_name_cooldown() {
        let app = build_router(test_state(ServerConfig::default()));
        let (token, _) = signup(&app, "p@example.com", "Pat").await;

        let update = call(
            &app,
            Method::PUT,
            "/api/user/profile",
            Some(&token),
            Some(json!({ "xp": 420, "gamesPlayed": 2, "wins": 1, "name": "Ignored" })),
        )
        .await;
        assert_eq!(update.status, StatusCode::OK);
        assert_eq!(update.body["user"]["xp"], 420);
        assert_eq!(update.body["user"]["name"], "Pat");

        let bad = call(
            &app,
            Method::PUT,
            "/api/user/profile",
            Some(&token),
            Some(json!({ "losses": 9 })),
        )
        .await;
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let renamed = call(
            &app,
            Method::PUT,
            "/api/user/change-name",
            Some(&token),
            Some(json!({ "name": "  Patricia " })),
        )
        .await;
        assert_eq!(renamed.status, StatusCode::OK);
        assert_eq!(renamed.body["user"]["name"], "Patricia");

        let again = call(
            &app,
            Method::PUT,
            "/api/user/change-name",
            Some(&token),
            Some(json!({ "name": "Patty" })),
        )
        .await;
        assert_eq!(again.status, StatusCode::FORBIDDEN);
        assert_eq!(again.body["daysLeft"], 60);

        let invalid = call(
            &app,
            Method::PUT,
            "/api/user/change-name",
            Some(&token),
            Some(json!({ "name": "P" })),
        )
        .await;
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn friend_request_lifecycle() {
        let app = build_router(test_state(ServerConfig::default()));
        let (ann, ann_id) = signup(&app, "ann@example.com", "Ann").await;
        let (bob, bob_id) = signup(&app, "bob@example.com", "Bob").await;

        let search = call(&app, Method::GET, "/api/friends/search?q=bo", Some(&ann), None).await;
        assert_eq!(search.status, StatusCode::OK);
        assert_eq!(search.body["users"][0]["id"], bob_id.as_str());

        let sent = call(
            &app,
            Method::POST,
            "/api/friends/request",
            Some(&ann),
            Some(json!({ "friendId": bob_id })),
        )
        .await;
        assert_eq!(sent.status, StatusCode::CREATED);
        assert_eq!(sent.body["request"]["status"], "pending");
        let request_id = sent.body["request"]["id"].as_i64().unwrap();

        let dup = call(
            &app,
            Method::POST,
            "/api/friends/request",
            Some(&bob),
            Some(json!({ "friendId": ann_id })),
        )
        .await;
        assert_eq!(dup.status, StatusCode::CONFLICT);

        let incoming = call(
            &app,
            Method::GET,
            "/api/friends/requests/incoming",
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(incoming.body["requests"][0]["senderName"], "Ann");

        // Only the receiver may act on the request.
        let uri = format!("/api/friends/request/{request_id}/accept");
        let stolen = call(&app, Method::POST, &uri, Some(&ann), None).await;
        assert_eq!(stolen.status, StatusCode::NOT_FOUND);

        let accepted = call(&app, Method::POST, &uri, Some(&bob), None).await;
        assert_eq!(accepted.status, StatusCode::OK);

        let friends = call(&app, Method::GET, "/api/friends", Some(&ann), None).await;
        assert_eq!(friends.body["friends"][0]["name"], "Bob");

        let remove_uri = format!("/api/friends/{bob_id}");
        for _ in 0..2 {
            let removed = call(&app, Method::DELETE, &remove_uri, Some(&ann), None).await;
            assert_eq!(removed.status, StatusCode::OK);
        }
        let friends = call(&app, Method::GET, "/api/friends", Some(&bob), None).await;
        assert_eq!(friends.body["friends"], json!([]));
    }

    #[tokio::test]
    async fn request_to_self_or_stranger() {
        let app = build_router(test_state(ServerConfig::default()));
        let (ann, ann_id) = signup(&app, "ann@example.com", "Ann").await;

        let own = call(
            &app,
            Method::POST,
            "/api/friends/request",
            Some(&ann),
            Some(json!({ "friendId": ann_id })),
        )
        .await;
        assert_eq!(own.status, StatusCode::BAD_REQUEST);

        let ghost = call(
            &app,
            Method::POST,
            "/api/friends/request",
            Some(&ann),
            Some(json!({ "friendId": uuid::Uuid::new_v4() })),
        )
        .await;
        assert_eq!(ghost.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn support_tickets() {
        let app = build_router(test_state(ServerConfig::default()));
        let (token, _) = signup(&app, "t@example.com", "Tess").await;

        let created = call(
            &app,
            Method::POST,
            "/api/support/ticket",
            Some(&token),
            Some(json!({ "subject": "Stuck", "message": "Timer never ends" })),
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["ticket"]["status"], "open");

        let blank = call(
            &app,
            Method::POST,
            "/api/support/ticket",
            Some(&token),
            Some(json!({ "subject": "", "message": "x" })),
        )
        .await;
        assert_eq!(blank.status, StatusCode::BAD_REQUEST);

        let list = call(&app, Method::GET, "/api/support/tickets", Some(&token), None).await;
        assert_eq!(list.body["tickets"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bad_input_gets_a_json_error_body() {
        let app = build_router(test_state(ServerConfig::default()));
        let (token, _) = signup(&app, "ada@example.com", "Ada").await;

        let reply = call(&app, Method::DELETE, "/api/friends/not-a-uuid", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["message"].is_string());

        let reply = call(
            &app,
            Method::POST,
            "/api/friends/request",
            Some(&token),
            Some(json!({ "friendId": 5 })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.body["message"].is_string());

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].is_string());
    }

    async fn login_attempt(app: &Router) -> StatusCode {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "198.51.100.4")
            .body(Body::from(
                json!({ "email": "x@example.com", "password": "secret1" }).to_string(),
            ))
            .unwrap();
        app.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn credential_routes_are_rate_limited() {
        let config = ServerConfig {
            auth_rate_per_sec: 0.001,
            auth_rate_burst: 2.0,
            ..ServerConfig::default()
        };
        let app = build_router(test_state(config));

        assert_eq!(login_attempt(&app).await, StatusCode::UNAUTHORIZED);
        assert_eq!(login_attempt(&app).await, StatusCode::UNAUTHORIZED);
        assert_eq!(login_attempt(&app).await, StatusCode::TOO_MANY_REQUESTS);

        // Other routes are not throttled.
        let health = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(health.status, StatusCode::OK);
    }
}
