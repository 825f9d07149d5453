//! The persisted entity types: User, Book, Chapter, Comment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh entity id
///
/// UUIDv7: stable, lexicographically sortable, and embeds the creation
/// timestamp in its high bits.
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// A registered user
///
/// `credential` is an opaque argon2id PHC string. It lives in the persisted
/// record only; API responses go through view types that omit it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    /// Unique, case-sensitive
    pub username: String,
    pub credential: String,
}

impl User {
    pub fn new(username: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            username: username.into(),
            credential: credential.into(),
        }
    }
}

/// A book, owned by its author
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub author_id: Uuid,
    /// Monotonically non-decreasing; the only mutable field not gated
    /// by ownership
    #[serde(default)]
    pub views: u64,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn new(author_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: description.into(),
            author_id,
            views: 0,
            created_at: Utc::now(),
        }
    }
}

/// A chapter of a book
///
/// Carries no owner of its own: ownership is resolved transitively through
/// the parent book's author, never denormalized onto the chapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(book_id: Uuid, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            content: content.into(),
            book_id,
            created_at: Utc::now(),
        }
    }
}

/// A reader comment on a chapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub chapter_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(chapter_id: Uuid, author_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            author_id,
            chapter_id,
            created_at: Utc::now(),
        }
    }
}
