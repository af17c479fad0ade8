use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState};

#[derive(Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /users/token
/// Exchange email and password for a bearer token key. Issuing twice for
/// the same account returns the same key.
pub async fn obtain_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("email", "This field may not be blank."));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation(
            "password",
            "This field may not be blank.",
        ));
    }

    let account = state
        .auth_service()
        .authenticate(&payload.email, &payload.password)
        .await?;

    let token = state.auth_service().issue_or_get_token(account.id).await?;

    Ok(Json(TokenResponse { token }))
}
