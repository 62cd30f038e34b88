//! Per-client rate limiting for the credential endpoints.
//!
//! Clients are keyed by peer IP from `ConnectInfo`. Requests without connect
//! info (in-process callers) share one bucket.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::AppState;
use crate::error::AppError;

/// Requests allowed per client per window.
pub const DEFAULT_AUTH_RATE_LIMIT_MAX: u32 = 100;

/// Window over which `max_requests` replenishes: 15 minutes.
pub const DEFAULT_AUTH_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_AUTH_RATE_LIMIT_MAX,
            window: DEFAULT_AUTH_RATE_LIMIT_WINDOW,
        }
    }
}

/// Keyed token bucket: a client may burst `max_requests`, then regains one
/// request every `window / max_requests`.
pub struct AuthRateLimiter {
    limiter: DefaultKeyedRateLimiter<Option<IpAddr>>,
}

impl AuthRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Count one request for `client`; false once its budget is spent.
    pub fn check(&self, client: Option<IpAddr>) -> bool {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client).is_ok()
    }
}

/// Axum middleware: rejects with 429 once the caller's budget is spent.
pub async fn limit_auth_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if !state.auth_limiter.check(client) {
        warn!(client = ?client, path = %request.uri().path(), "auth rate limit exceeded");
        return Err(AppError::TooManyRequests(
            "Too many requests, please try again later".into(),
        ));
    }

    Ok(next.run(request).await)
}
