//! Chapter handlers
//!
//! Every mutation authorizes against the parent book's author, with the
//! chain resolved from storage rather than anything client-supplied.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use fable_core::{
    policy::{self, Operation, Resource},
    Chapter, FableError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::books::{resolve_book, BookView};
use crate::state::AppState;

/// A chapter with its parent book resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub book: BookView,
    pub created_at: DateTime<Utc>,
}

/// Get a chapter, with the parent book embedded
pub async fn get_chapter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ChapterView>> {
    let (chapter, book) = state.store.chapter_with_book(id).await?;
    Ok(Json(ChapterView {
        id: chapter.id,
        title: chapter.title,
        content: chapter.content,
        book: resolve_book(&state, book).await,
        created_at: chapter.created_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChapterPayload {
    pub title: String,
    pub content: String,
}

fn validate_payload(req: &ChapterPayload) -> ApiResult<()> {
    if req.title.trim().is_empty() {
        return Err(FableError::Validation("title must not be empty".to_string()).into());
    }
    if req.content.trim().is_empty() {
        return Err(FableError::Validation("content must not be empty".to_string()).into());
    }
    Ok(())
}

/// Add a chapter to a book
pub async fn create_chapter(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ChapterPayload>,
) -> ApiResult<(StatusCode, Json<Chapter>)> {
    validate_payload(&req)?;

    let book = state.store.book(book_id).await?;
    policy::authorize(actor, Operation::Create, Resource::Chapter { book: &book })?;

    let chapter = state
        .store
        .create_chapter(book_id, &req.title, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// Replace a chapter's title and content
pub async fn update_chapter(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChapterPayload>,
) -> ApiResult<Json<Chapter>> {
    validate_payload(&req)?;

    let (_, book) = state.store.chapter_with_book(id).await?;
    policy::authorize(actor, Operation::Edit, Resource::Chapter { book: &book })?;

    let chapter = state.store.update_chapter(id, &req.title, &req.content).await?;
    Ok(Json(chapter))
}

/// Delete a chapter (and, with it, its comments)
pub async fn delete_chapter(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let (_, book) = state.store.chapter_with_book(id).await?;
    policy::authorize(actor, Operation::Delete, Resource::Chapter { book: &book })?;

    state.store.delete_chapter(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
