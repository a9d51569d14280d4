use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::auth::{self, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Extractor that validates the bearer token on protected routes and
/// hands the decoded claims to the handler. A rejected request is
/// terminal; the client must re-authenticate for a fresh token.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::MissingToken)?;

        // Format: "Bearer <token>"
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::InvalidToken)?;

        // Malformed, tampered and expired tokens are rejected uniformly
        let claims = auth::verify_token(token, &state.config.jwt_secret)
            .map_err(|_| AppError::InvalidToken)?;

        Ok(AuthUser(claims))
    }
}
