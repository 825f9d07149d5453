//! Bookshelf handlers
//!
//! The one read surface that stays behind the session gate: a bookshelf is
//! private to its owner.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::books::{resolve_book, BookView};
use crate::state::AppState;

/// Membership state after a bookshelf mutation
#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub saved: bool,
}

/// Flip a book in or out of the caller's bookshelf
///
/// Two toggles return membership to its original state; a blind retry of
/// one may double-flip. Callers needing idempotence use the PUT form.
pub async fn toggle_save(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<SavedResponse>> {
    let saved = state.store.toggle_saved(actor, book_id).await?;
    Ok(Json(SavedResponse { saved }))
}

#[derive(Debug, Deserialize)]
pub struct SetSavedRequest {
    pub saved: bool,
}

/// Idempotently set a book's membership in the caller's bookshelf
pub async fn set_save(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(book_id): Path<Uuid>,
    Json(req): Json<SetSavedRequest>,
) -> ApiResult<Json<SavedResponse>> {
    let saved = state.store.set_saved(actor, book_id, req.saved).await?;
    Ok(Json(SavedResponse { saved }))
}

/// The caller's saved books, in save order
///
/// Books are resolved at read time; ids that no longer resolve are
/// filtered out, never surfaced as an error.
pub async fn list_bookshelf(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Json<Vec<BookView>> {
    let books = state.store.saved_books(actor).await;
    let mut views = Vec::with_capacity(books.len());
    for book in books {
        views.push(resolve_book(&state, book).await);
    }
    Json(views)
}
