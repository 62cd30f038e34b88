//! # warden_api
//!
//! HTTP API library for Warden.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use warden_core::auth::session::SessionService;

use crate::handlers::{auth, health, users};
use crate::middleware::rate_limit::{AuthRateLimiter, RateLimitConfig};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session flows and the identity store behind them.
    pub sessions: Arc<SessionService>,
    /// Per-client budget for login, registration, and verification.
    pub auth_limiter: Arc<AuthRateLimiter>,
}

impl AppState {
    pub fn new(sessions: SessionService) -> Self {
        Self::with_rate_limit(sessions, RateLimitConfig::default())
    }

    pub fn with_rate_limit(sessions: SessionService, rate_limit: RateLimitConfig) -> Self {
        Self {
            sessions: Arc::new(sessions),
            auth_limiter: Arc::new(AuthRateLimiter::new(rate_limit)),
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler));

    // Credential routes (public, rate limited per client)
    let credentials = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::GET_AUTH_VERIFY, get(auth::verify_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::limit_auth_requests,
        ));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(routes::GET_USERS_ID, get(users::get_user_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(credentials)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
