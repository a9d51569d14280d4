use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chat::{FALLBACK_REPLY, MAX_MESSAGE_LEN};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/chat
#[tracing::instrument(skip(state, _auth_user, payload))]
pub async fn relay(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Json(payload): Json<ChatPayload>,
) -> Result<Response, AppError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation("message is too long".to_string()));
    }

    match state.chat.relay(message).await {
        Ok(reply) => Ok(Json(ChatResponse { reply }).into_response()),
        Err(e) => {
            // Provider detail stays in the server log; the client only
            // ever sees the fixed fallback reply.
            tracing::error!("Chat relay failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse {
                    reply: FALLBACK_REPLY.to_string(),
                }),
            )
                .into_response())
        }
    }
}
