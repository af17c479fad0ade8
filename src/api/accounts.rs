use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::db::{Account, NewAccount};
use crate::services::ProfileUpdate;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub email: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Authenticated account, inserted by [`auth_middleware`] as a request
/// extension for downstream handlers.
#[derive(Clone)]
pub struct CurrentAccount(pub Account);

// ============================================================================
// Middleware
// ============================================================================

/// Token authentication middleware for `/users/me`. Expects
/// `Authorization: Token <key>` and attaches the resolved account as a
/// request extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // The profile endpoint is retrieve/update only. Reject POST before
    // authentication so the status does not depend on the caller's token.
    if request.method() == Method::POST {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let Some(key) = extract_token_key(&headers) else {
        return Err(ApiError::Unauthorized(
            "Authentication credentials were not provided.".to_string(),
        ));
    };

    let account = state.auth_service().resolve_token(&key).await?;

    request.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(request).await)
}

/// Extract the token key from an `Authorization: Token <key>` header
fn extract_token_key(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(key) = auth_str.strip_prefix("Token ")
    {
        return Some(key.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users/create
/// Register a new account, returns its public profile on success
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let min_length = {
        let config = state.config().read().await;
        config.security.min_password_length
    };

    validate_password_length(&payload.password, min_length)?;

    let profile = state
        .account_service()
        .create_account(NewAccount {
            email: payload.email,
            password: Some(payload.password),
            name: payload.name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            email: profile.email,
            name: profile.name,
        }),
    ))
}

/// GET /users/me
/// Return the authenticated account's profile
pub async fn me(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentAccount>,
) -> Result<Json<AccountResponse>, ApiError> {
    let profile = state.account_service().get_profile(current.0.id).await?;

    Ok(Json(AccountResponse {
        email: profile.email,
        name: profile.name,
    }))
}

/// PATCH/PUT /users/me
/// Update the authenticated account's name and/or password
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentAccount>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if let Some(password) = &payload.password {
        let min_length = {
            let config = state.config().read().await;
            config.security.min_password_length
        };
        validate_password_length(password, min_length)?;
    }

    let profile = state
        .account_service()
        .update_profile(
            current.0.id,
            ProfileUpdate {
                name: payload.name,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(AccountResponse {
        email: profile.email,
        name: profile.name,
    }))
}

fn validate_password_length(password: &str, min_length: usize) -> Result<(), ApiError> {
    if password.chars().count() < min_length {
        return Err(ApiError::validation(
            "password",
            format!("Ensure this field has at least {min_length} characters."),
        ));
    }
    Ok(())
}
