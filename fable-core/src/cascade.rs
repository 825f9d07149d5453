//! The cascade engine
//!
//! Orchestrates multi-entity deletion: removing a book must leave zero
//! orphaned chapters and zero orphaned comments, as an all-or-nothing
//! outcome from the caller's perspective. Authorization happens first,
//! before any dependent is touched; the removal itself is the store's one
//! transactionally-scoped operation.

use uuid::Uuid;

use crate::error::Result;
use crate::policy::{self, Operation, Resource};
use crate::store::Store;

/// What a cascade removed, besides the book itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeReport {
    pub chapters_deleted: usize,
    pub comments_deleted: usize,
}

/// Delete `book_id` and its whole dependent tree on behalf of `actor`
///
/// Fails fast with `NotFound` or `Forbidden` before touching dependents. A
/// storage failure after that point surfaces as `Internal`; the operation
/// is not blindly retryable, but a partially-deleted book is never
/// re-exposed as live.
pub async fn delete_book(store: &Store, actor: Uuid, book_id: Uuid) -> Result<CascadeReport> {
    let book = store.book(book_id).await?;
    policy::authorize(actor, Operation::Delete, Resource::Book(&book))?;
    store.delete_book_tree(book_id).await
}
