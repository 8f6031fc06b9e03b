use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{error::AppError, services::identity_service, state::AppState};

/// The resolved local identity of the caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub user_type: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == "admin"
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Owner-only mutation rule: any actor may read, only the owner may mutate.
pub fn ensure_owner(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id != owner_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn bearer_token(parts: &axum::http::request::Parts) -> Option<String> {
    let auth_str = parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        let identity = state.verifier.verify(&token).await?;
        let user = identity_service::resolve(state, &identity).await?;

        Ok(AuthUser {
            user_id: user.id,
            user_type: user.user_type,
        })
    }
}
