//! Authentication request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use warden_core::models::auth::Claims;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, VerifyResponse};

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(b)| b)
        .map_err(|_| AppError::BadRequest("invalid request body".into()))
}

/// `POST /api/auth/login` — authenticate with email + password.
///
/// Missing fields fail the same way as wrong ones.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let body = json_body(body)?;
    let session = state.sessions.login(&body.email, &body.password).await?;
    Ok(Json(session.into()))
}

/// `POST /api/auth/register` — create a new account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let body = json_body(body)?;
    let session = state
        .sessions
        .register(&body.email, &body.password, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `GET /api/auth/verify` — check the bearer token and echo its identity.
pub async fn verify_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<VerifyResponse>> {
    let claims = state.sessions.validate(authorization(&headers))?;
    Ok(Json(claims.into()))
}

/// `POST /api/auth/refresh` — exchange a valid token for a fresh one.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<TokenResponse>> {
    let session = state.sessions.refresh(authorization(&headers)).await?;
    Ok(Json(session.into()))
}

/// `GET /api/auth/me` — the caller's claims. Requires authentication.
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<Claims> {
    Json(user.0)
}
