//! Authentication middleware — Bearer token extraction and verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use warden_core::models::auth::{Claims, Role};

use crate::AppState;
use crate::error::AppError;

/// Verified caller, stored in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.0.role)
    }

    /// Admins may access any resource; everyone else only their own.
    pub fn can_access(&self, owner_id: i64) -> bool {
        self.has_role(&[Role::Admin]) || self.0.subject_id == owner_id
    }
}

/// Axum middleware: validates `Authorization: Bearer <token>` and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let claims = state.sessions.validate(header)?;
    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn user(id: i64, role: Role) -> AuthenticatedUser {
        AuthenticatedUser(Claims {
            subject_id: id,
            email: "a@b.com".into(),
            role,
            issued_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            expires_at: DateTime::from_timestamp(1_700_086_400, 0).unwrap(),
            issuer: "warden-auth".into(),
        })
    }

    #[test]
    fn owner_or_admin_access() {
        assert!(user(1, Role::User).can_access(1));
        assert!(!user(1, Role::User).can_access(2));
        assert!(user(1, Role::Admin).can_access(2));
    }

    #[test]
    fn role_check() {
        assert!(user(1, Role::Admin).has_role(&[Role::Admin]));
        assert!(!user(1, Role::User).has_role(&[Role::Admin]));
        assert!(user(1, Role::User).has_role(&[Role::User, Role::Admin]));
    }
}
