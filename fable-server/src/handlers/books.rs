//! Book handlers: listing, detail, creation, cascade deletion, views

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use fable_core::{cascade, Book, Chapter, FableError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// A book author, resolved to the fields readers may see
#[derive(Debug, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
}

/// A book with its author resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author: AuthorView,
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

/// Resolve a book's author reference at read time
///
/// Users are never deleted, so a dangling author would be a storage
/// defect; rendered as "unknown" rather than failing the whole read.
pub(crate) async fn resolve_book(state: &AppState, book: Book) -> BookView {
    let username = state
        .store
        .user(book.author_id)
        .await
        .map(|u| u.username)
        .unwrap_or_else(|_| "unknown".to_string());
    BookView {
        id: book.id,
        title: book.title,
        description: book.description,
        author: AuthorView {
            id: book.author_id,
            username,
        },
        views: book.views,
        created_at: book.created_at,
    }
}

/// Query parameters for listing books
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// Restrict to a single author
    pub author: Option<Uuid>,
}

/// List all books, optionally filtered by author
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> Json<Vec<BookView>> {
    let books = state.store.books(query.author).await;
    let mut views = Vec::with_capacity(books.len());
    for book in books {
        views.push(resolve_book(&state, book).await);
    }
    Json(views)
}

/// Book detail response: the book plus its chapters in creation order
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    pub book: BookView,
    pub chapters: Vec<Chapter>,
}

/// Get a single book with its chapters
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BookDetailResponse>> {
    let book = state.store.book(id).await?;
    let chapters = state.store.chapters_of(id).await;
    Ok(Json(BookDetailResponse {
        book: resolve_book(&state, book).await,
        chapters,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Create a book owned by the calling user
pub async fn create_book(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<CreateBookRequest>,
) -> ApiResult<(StatusCode, Json<BookView>)> {
    if req.title.trim().is_empty() {
        return Err(FableError::Validation("title must not be empty".to_string()).into());
    }

    let book = state
        .store
        .create_book(actor, &req.title, req.description.as_deref().unwrap_or(""))
        .await?;
    Ok((StatusCode::CREATED, Json(resolve_book(&state, book).await)))
}

/// What the cascade removed along with the book
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookResponse {
    pub chapters_deleted: usize,
    pub comments_deleted: usize,
}

/// Delete a book and everything that exists only in relation to it
pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteBookResponse>> {
    let report = cascade::delete_book(&state.store, actor, id).await?;
    tracing::info!(
        book = %id,
        chapters = report.chapters_deleted,
        comments = report.comments_deleted,
        "deleted book tree"
    );
    Ok(Json(DeleteBookResponse {
        chapters_deleted: report.chapters_deleted,
        comments_deleted: report.comments_deleted,
    }))
}

/// Record one view event, fire-and-forget
///
/// Unauthenticated and never fails the caller; a failed increment is
/// logged and swallowed.
pub async fn record_view(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if let Err(e) = state.store.increment_views(id).await {
        tracing::warn!("failed to record view for {id}: {e}");
    }
    StatusCode::NO_CONTENT
}
