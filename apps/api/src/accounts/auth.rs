use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::accounts::tokens::TokenType;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// The active user identified by a `Bearer` access token.
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.0.is_staff {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Authorization header must be 'Bearer <token>'".to_string())
            })?;

        let user_id = state.tokens.verify(token, TokenType::Access)?;
        let user = state
            .store
            .get_user(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
        Ok(AuthUser(user))
    }
}
