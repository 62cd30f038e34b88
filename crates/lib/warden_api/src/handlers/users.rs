//! Identity lookup handlers.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserResponse;

/// `GET /api/users/{id}` — admins may read any identity, others only their own.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<UserResponse>> {
    let Path(id) = id.map_err(|_| AppError::BadRequest("invalid user id".into()))?;
    if !user.can_access(id) {
        return Err(AppError::Forbidden("Access denied".into()));
    }

    let identity = state
        .sessions
        .store()
        .find_by_id(id)
        .await
        .map_err(warden_core::auth::AuthError::from)?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    Ok(Json(identity.into()))
}
