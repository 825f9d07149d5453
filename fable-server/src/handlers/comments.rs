//! Comment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use fable_core::{
    policy::{self, Operation, Resource},
    Comment, FableError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::books::AuthorView;
use crate::state::AppState;

/// A comment with its author resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub author: AuthorView,
    pub chapter_id: Uuid,
    pub created_at: DateTime<Utc>,
}

async fn resolve_comment(state: &AppState, comment: Comment) -> CommentView {
    let username = state
        .store
        .user(comment.author_id)
        .await
        .map(|u| u.username)
        .unwrap_or_else(|_| "unknown".to_string());
    CommentView {
        id: comment.id,
        content: comment.content,
        author: AuthorView {
            id: comment.author_id,
            username,
        },
        chapter_id: comment.chapter_id,
        created_at: comment.created_at,
    }
}

/// List a chapter's comments, newest first
///
/// A chapter that no longer exists has no comments; the read path answers
/// with an empty list rather than an error.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(chapter_id): Path<Uuid>,
) -> Json<Vec<CommentView>> {
    let comments = state.store.comments_of(chapter_id).await;
    let mut views = Vec::with_capacity(comments.len());
    for comment in comments {
        views.push(resolve_comment(&state, comment).await);
    }
    Json(views)
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Comment on a chapter; open to any authenticated user
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(chapter_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    if req.content.trim().is_empty() {
        return Err(FableError::Validation("content must not be empty".to_string()).into());
    }

    let comment = state
        .store
        .create_comment(chapter_id, actor, &req.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(resolve_comment(&state, comment).await),
    ))
}

/// Delete a comment; only its author may
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = state.store.comment(id).await?;
    policy::authorize(actor, Operation::Delete, Resource::Comment(&comment))?;

    state.store.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
