use axum::{extract::State, Json};
use tracing::info;

use crate::auth;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::user::{AuthResponse, LoginPayload, MeResponse, RegisterPayload};
use crate::state::AppState;

/// POST /api/auth/register
#[tracing::instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "name, email and password are required".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state.store.create(name, email, &password_hash).await?;
    let token = auth::issue_token(&user, &state.config.jwt_secret)?;

    info!("Registered user {}", user.email);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/login
#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    // Unknown email and wrong password take the same error path
    let user = state
        .store
        .find_by_email(payload.email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = auth::issue_token(&user, &state.config.jwt_secret)?;

    info!("User {} logged in", user.email);

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me
#[tracing::instrument(skip(state, auth_user))]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .store
        .find_by_id(&auth_user.0.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;

    Ok(Json(MeResponse { user: user.into() }))
}
