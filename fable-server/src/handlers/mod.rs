//! Request handlers

mod auth;
mod books;
mod bookshelf;
mod chapters;
mod comments;
mod users;

pub use auth::*;
pub use books::*;
pub use bookshelf::*;
pub use chapters::*;
pub use comments::*;
pub use users::*;

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
