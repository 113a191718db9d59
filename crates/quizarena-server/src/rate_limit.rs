//! Per-IP token buckets guarding the credential endpoints.
//!
//! Each client address gets `burst` attempts up front, refilled at `rate`
//! per second. A refused request carries `Retry-After` with the seconds
//! until the next token.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Policy {
    rate: f64,
    burst: f64,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    touched: Instant,
}

impl Bucket {
    /// Take one token, or report how long until one is available.
    fn take(&mut self, policy: Policy, now: Instant) -> Result<(), Duration> {
        let refill = now.duration_since(self.touched).as_secs_f64() * policy.rate;
        self.tokens = (self.tokens + refill).min(policy.burst);
        self.touched = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / policy.rate))
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    policy: Policy,
}

impl RateLimiter {
    pub fn new(rate: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            policy: Policy { rate, burst },
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.auth_rate_per_sec, config.auth_rate_burst)
    }

    /// `Err` holds the wait before `ip` may try again.
    pub async fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(ip)
            .or_insert(Bucket {
                tokens: self.policy.burst,
                touched: now,
            })
            .take(self.policy, now)
    }

    /// Forget addresses not seen for `idle`. Returns how many were dropped.
    pub async fn purge_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.duration_since(bucket.touched) < idle);
        before - buckets.len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(&req) else {
        return next.run(req).await;
    };

    match limiter.check(ip).await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            warn!(%ip, path = %req.uri().path(), "auth rate limit hit");
            let mut response = ApiError::RateLimited.into_response();
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
            response
        }
    }
}

/// The peer address, or the first proxy header when there is no socket
/// info (e.g. behind a test harness).
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }

    ["x-forwarded-for", "x-real-ip"].into_iter().find_map(|name| {
        req.headers()
            .get(name)?
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse()
            .ok()
    })
}
