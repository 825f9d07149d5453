//! User profile handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// A user minus their credential
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
}

/// Public profile lookup
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserView>> {
    let user = state.store.user(id).await?;
    Ok(Json(UserView {
        id: user.id,
        username: user.username,
    }))
}
