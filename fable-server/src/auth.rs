//! Request authentication
//!
//! The `AuthUser` extractor runs the session gate for protected routes and
//! hands the resolved actor to the handler as an explicit argument. There
//! is no ambient per-request identity anywhere else.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use fable_core::FableError;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The actor resolved from a verified session token
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError(FableError::Unauthenticated))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError(FableError::Unauthenticated))?;
        let user_id = state.gate.verify(token)?;
        Ok(AuthUser(user_id))
    }
}
