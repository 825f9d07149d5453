//! Registration and login

use axum::{extract::State, http::StatusCode, Json};
use fable_core::{credentials, FableError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    if req.username.trim().is_empty() {
        return Err(FableError::Validation("username must not be empty".to_string()).into());
    }
    if req.password.is_empty() {
        return Err(FableError::Validation("password must not be empty".to_string()).into());
    }

    let credential = credentials::hash_password(&req.password)?;
    let user = state.store.create_user(&req.username, credential).await?;
    tracing::info!(username = %user.username, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub user_id: Uuid,
}

/// Exchange a username and password for a session token
///
/// An unknown username and a wrong password fail identically, so the
/// endpoint does not leak which usernames exist.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .store
        .user_by_username(&req.username)
        .await
        .map_err(|_| FableError::InvalidCredential)?;
    credentials::verify_password(&req.password, &user.credential)?;

    let token = state.gate.issue(user.id)?;
    Ok(Json(LoginResponse {
        token,
        username: user.username,
        user_id: user.id,
    }))
}
