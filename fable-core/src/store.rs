//! The resource repository
//!
//! Persistence for users, books, chapters, comments and bookshelves. All
//! collections live behind a single `RwLock`; one write-lock scope is the
//! unit of atomicity, which is what makes the cascade in
//! [`delete_book_tree`](Store::delete_book_tree) a single logical unit to
//! concurrent readers. The tables are persisted as a JSON file after every
//! mutation, written to a temp file then renamed to avoid partial writes.
//!
//! The repository performs no authorization; that belongs to
//! [`policy`](crate::policy), keeping the two independently testable.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::cascade::CascadeReport;
use crate::entities::{Book, Chapter, Comment, User};
use crate::error::{FableError, Result};

/// The persisted collections
///
/// Relationships are foreign-key-style id references, resolved at read
/// time; nothing is embedded. Bookshelves are insertion-ordered id lists.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    pub users: HashMap<Uuid, User>,
    pub books: HashMap<Uuid, Book>,
    pub chapters: HashMap<Uuid, Chapter>,
    pub comments: HashMap<Uuid, Comment>,
    pub bookshelves: HashMap<Uuid, Vec<Uuid>>,
}

/// The repository
pub struct Store {
    path: PathBuf,
    tables: RwLock<Tables>,
    /// Serializes persistence: writers share one temp path, so the whole
    /// serialize-write-rename sequence must be mutually exclusive
    persist_lock: Mutex<()>,
}

impl Store {
    /// Open a store backed by the JSON file at `path`
    ///
    /// A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tables = match tokio::fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            tables: RwLock::new(tables),
            persist_lock: Mutex::new(()),
        })
    }

    /// Persist the tables atomically
    ///
    /// Writes to a temp file in the same directory then renames over the
    /// target, so a crash never leaves a half-written file. Persists from
    /// concurrent mutations are serialized by `persist_lock`: the snapshot
    /// is taken under it, so later-queued persists always write an
    /// equal-or-newer state and overlapping writers can never steal each
    /// other's temp file out from under the rename.
    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let data = {
            let tables = self.tables.read().await;
            serde_json::to_string_pretty(&*tables)?
        };
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &data).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    // ---- users --------------------------------------------------------

    /// Register a user; usernames are unique, case-sensitive
    pub async fn create_user(&self, username: &str, credential: String) -> Result<User> {
        let user = {
            let mut tables = self.tables.write().await;
            if tables.users.values().any(|u| u.username == username) {
                return Err(FableError::Conflict(format!(
                    "username '{username}' is already taken"
                )));
            }
            let user = User::new(username, credential);
            tables.users.insert(user.id, user.clone());
            user
        };
        self.persist().await?;
        Ok(user)
    }

    pub async fn user(&self, id: Uuid) -> Result<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or(FableError::NotFound("user"))
    }

    pub async fn user_by_username(&self, username: &str) -> Result<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(FableError::NotFound("user"))
    }

    // ---- books --------------------------------------------------------

    pub async fn create_book(
        &self,
        author_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Book> {
        let book = {
            let mut tables = self.tables.write().await;
            let book = Book::new(author_id, title, description);
            tables.books.insert(book.id, book.clone());
            book
        };
        self.persist().await?;
        Ok(book)
    }

    pub async fn book(&self, id: Uuid) -> Result<Book> {
        let tables = self.tables.read().await;
        tables
            .books
            .get(&id)
            .cloned()
            .ok_or(FableError::NotFound("book"))
    }

    /// All books, newest first, optionally filtered by author
    pub async fn books(&self, author: Option<Uuid>) -> Vec<Book> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables
            .books
            .values()
            .filter(|b| author.map_or(true, |a| b.author_id == a))
            .cloned()
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        books
    }

    /// Delete a book together with its chapters, their comments, and every
    /// bookshelf reference to it
    ///
    /// The whole removal happens under one write-lock scope: a concurrent
    /// read can never observe a comment or chapter whose parent is already
    /// gone. Within the scope, comments go first, then chapters, then the
    /// book, so an interruption leaves only fewer downstream artifacts,
    /// never a dangling upward reference.
    pub async fn delete_book_tree(&self, book_id: Uuid) -> Result<CascadeReport> {
        let report = {
            let mut tables = self.tables.write().await;
            if !tables.books.contains_key(&book_id) {
                return Err(FableError::NotFound("book"));
            }
            let chapter_ids: HashSet<Uuid> = tables
                .chapters
                .values()
                .filter(|c| c.book_id == book_id)
                .map(|c| c.id)
                .collect();

            let comments_before = tables.comments.len();
            tables
                .comments
                .retain(|_, c| !chapter_ids.contains(&c.chapter_id));
            let comments_deleted = comments_before - tables.comments.len();

            tables.chapters.retain(|_, c| c.book_id != book_id);
            tables.books.remove(&book_id);

            for shelf in tables.bookshelves.values_mut() {
                shelf.retain(|b| *b != book_id);
            }

            CascadeReport {
                chapters_deleted: chapter_ids.len(),
                comments_deleted,
            }
        };
        self.persist().await?;
        Ok(report)
    }

    /// Record one view event; unauthenticated, no per-viewer dedup
    ///
    /// Increments under the write lock, so concurrent views never lose
    /// updates. A missing book is a silent no-op.
    pub async fn increment_views(&self, book_id: Uuid) -> Result<()> {
        let hit = {
            let mut tables = self.tables.write().await;
            match tables.books.get_mut(&book_id) {
                Some(book) => {
                    book.views += 1;
                    true
                }
                None => false,
            }
        };
        if hit {
            self.persist().await?;
        }
        Ok(())
    }

    // ---- chapters -----------------------------------------------------

    pub async fn create_chapter(
        &self,
        book_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Chapter> {
        let chapter = {
            let mut tables = self.tables.write().await;
            if !tables.books.contains_key(&book_id) {
                return Err(FableError::NotFound("book"));
            }
            let chapter = Chapter::new(book_id, title, content);
            tables.chapters.insert(chapter.id, chapter.clone());
            chapter
        };
        self.persist().await?;
        Ok(chapter)
    }

    pub async fn chapter(&self, id: Uuid) -> Result<Chapter> {
        let tables = self.tables.read().await;
        tables
            .chapters
            .get(&id)
            .cloned()
            .ok_or(FableError::NotFound("chapter"))
    }

    /// Load a chapter together with its resolved parent book
    ///
    /// This is the ownership chain the policy authorizes against. A chapter
    /// whose book is gone would be a broken cascade invariant, reported as
    /// an internal error.
    pub async fn chapter_with_book(&self, id: Uuid) -> Result<(Chapter, Book)> {
        let tables = self.tables.read().await;
        let chapter = tables
            .chapters
            .get(&id)
            .cloned()
            .ok_or(FableError::NotFound("chapter"))?;
        let book = tables
            .books
            .get(&chapter.book_id)
            .cloned()
            .ok_or_else(|| {
                FableError::Internal(format!("chapter {id} references a missing book"))
            })?;
        Ok((chapter, book))
    }

    /// Chapters of a book, in creation order
    pub async fn chapters_of(&self, book_id: Uuid) -> Vec<Chapter> {
        let tables = self.tables.read().await;
        let mut chapters: Vec<Chapter> = tables
            .chapters
            .values()
            .filter(|c| c.book_id == book_id)
            .cloned()
            .collect();
        chapters.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        chapters
    }

    pub async fn update_chapter(&self, id: Uuid, title: &str, content: &str) -> Result<Chapter> {
        let chapter = {
            let mut tables = self.tables.write().await;
            let chapter = tables
                .chapters
                .get_mut(&id)
                .ok_or(FableError::NotFound("chapter"))?;
            chapter.title = title.to_owned();
            chapter.content = content.to_owned();
            chapter.clone()
        };
        self.persist().await?;
        Ok(chapter)
    }

    /// Delete a chapter and its comments
    ///
    /// Comments go first, preserving "every comment references a live
    /// chapter" under interruption.
    pub async fn delete_chapter(&self, id: Uuid) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            if !tables.chapters.contains_key(&id) {
                return Err(FableError::NotFound("chapter"));
            }
            tables.comments.retain(|_, c| c.chapter_id != id);
            tables.chapters.remove(&id);
        }
        self.persist().await?;
        Ok(())
    }

    // ---- comments -----------------------------------------------------

    pub async fn create_comment(
        &self,
        chapter_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let comment = {
            let mut tables = self.tables.write().await;
            if !tables.chapters.contains_key(&chapter_id) {
                return Err(FableError::NotFound("chapter"));
            }
            let comment = Comment::new(chapter_id, author_id, content);
            tables.comments.insert(comment.id, comment.clone());
            comment
        };
        self.persist().await?;
        Ok(comment)
    }

    pub async fn comment(&self, id: Uuid) -> Result<Comment> {
        let tables = self.tables.read().await;
        tables
            .comments
            .get(&id)
            .cloned()
            .ok_or(FableError::NotFound("comment"))
    }

    /// Comments of a chapter, newest first
    pub async fn comments_of(&self, chapter_id: Uuid) -> Vec<Comment> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.chapter_id == chapter_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        comments
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<()> {
        {
            let mut tables = self.tables.write().await;
            if tables.comments.remove(&id).is_none() {
                return Err(FableError::NotFound("comment"));
            }
        }
        self.persist().await?;
        Ok(())
    }

    // ---- bookshelves --------------------------------------------------

    /// Flip a book's membership in the user's bookshelf
    ///
    /// Returns the new membership state. Not safe to retry blindly; callers
    /// needing idempotence use [`set_saved`](Store::set_saved).
    pub async fn toggle_saved(&self, user_id: Uuid, book_id: Uuid) -> Result<bool> {
        let saved = {
            let mut tables = self.tables.write().await;
            if !tables.books.contains_key(&book_id) {
                return Err(FableError::NotFound("book"));
            }
            let shelf = tables.bookshelves.entry(user_id).or_default();
            match shelf.iter().position(|b| *b == book_id) {
                Some(pos) => {
                    shelf.remove(pos);
                    false
                }
                None => {
                    shelf.push(book_id);
                    true
                }
            }
        };
        self.persist().await?;
        Ok(saved)
    }

    /// Idempotently set a book's membership in the user's bookshelf
    pub async fn set_saved(&self, user_id: Uuid, book_id: Uuid, desired: bool) -> Result<bool> {
        {
            let mut tables = self.tables.write().await;
            if !tables.books.contains_key(&book_id) {
                return Err(FableError::NotFound("book"));
            }
            let shelf = tables.bookshelves.entry(user_id).or_default();
            let pos = shelf.iter().position(|b| *b == book_id);
            match (pos, desired) {
                (None, true) => shelf.push(book_id),
                (Some(pos), false) => {
                    shelf.remove(pos);
                }
                _ => {}
            }
        }
        self.persist().await?;
        Ok(desired)
    }

    /// The user's saved books, in save order, resolved at read time
    ///
    /// Ids that no longer resolve are silently filtered, never surfaced as
    /// an error.
    pub async fn saved_books(&self, user_id: Uuid) -> Vec<Book> {
        let tables = self.tables.read().await;
        tables
            .bookshelves
            .get(&user_id)
            .map(|shelf| {
                shelf
                    .iter()
                    .filter_map(|id| tables.books.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store() -> (Store, TempDir) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = Store::open(dir.path().join("fable.json")).await.unwrap();
        (store, dir)
    }

    async fn seed_author(store: &Store, name: &str) -> User {
        store.create_user(name, "hash".to_owned()).await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let (store, _dir) = open_store().await;
        let first = seed_author(&store, "ada").await;
        let err = store.create_user("ada", "other".to_owned()).await;
        assert!(matches!(err, Err(FableError::Conflict(_))));
        // The first record is unaffected
        assert_eq!(store.user(first.id).await.unwrap().username, "ada");
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (store, _dir) = open_store().await;
        let id = crate::entities::new_id();
        assert!(matches!(store.book(id).await, Err(FableError::NotFound(_))));
        assert!(matches!(
            store.chapter(id).await,
            Err(FableError::NotFound(_))
        ));
        assert!(matches!(
            store.comment(id).await,
            Err(FableError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn cascade_removes_exactly_the_book_tree() {
        let (store, _dir) = open_store().await;
        let author = seed_author(&store, "ada").await;
        let reader = seed_author(&store, "reader").await;

        let doomed = store.create_book(author.id, "Doomed", "").await.unwrap();
        let kept = store.create_book(author.id, "Kept", "").await.unwrap();
        let c1 = store
            .create_chapter(doomed.id, "One", "...")
            .await
            .unwrap();
        let c2 = store
            .create_chapter(doomed.id, "Two", "...")
            .await
            .unwrap();
        let kept_ch = store.create_chapter(kept.id, "One", "...").await.unwrap();
        store.create_comment(c1.id, reader.id, "hi").await.unwrap();
        store.create_comment(c2.id, reader.id, "ho").await.unwrap();
        let kept_comment = store
            .create_comment(kept_ch.id, reader.id, "stays")
            .await
            .unwrap();
        store.toggle_saved(reader.id, doomed.id).await.unwrap();

        let report = store.delete_book_tree(doomed.id).await.unwrap();
        assert_eq!(report.chapters_deleted, 2);
        assert_eq!(report.comments_deleted, 2);

        assert!(store.book(doomed.id).await.is_err());
        assert!(store.chapter(c1.id).await.is_err());
        assert!(store.chapter(c2.id).await.is_err());
        assert!(store.comments_of(c1.id).await.is_empty());
        // The sibling tree survives untouched
        assert!(store.book(kept.id).await.is_ok());
        assert!(store.comment(kept_comment.id).await.is_ok());
        // The bookshelf no longer references the dead book
        assert!(store.saved_books(reader.id).await.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_missing_book_is_not_found() {
        let (store, _dir) = open_store().await;
        assert!(matches!(
            store.delete_book_tree(crate::entities::new_id()).await,
            Err(FableError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn chapter_delete_takes_its_comments() {
        let (store, _dir) = open_store().await;
        let author = seed_author(&store, "ada").await;
        let book = store.create_book(author.id, "B", "").await.unwrap();
        let chapter = store.create_chapter(book.id, "C", "...").await.unwrap();
        store
            .create_comment(chapter.id, author.id, "note")
            .await
            .unwrap();

        store.delete_chapter(chapter.id).await.unwrap();
        assert!(store.chapter(chapter.id).await.is_err());
        assert!(store.comments_of(chapter.id).await.is_empty());
    }

    #[tokio::test]
    async fn toggle_twice_returns_to_original_state() {
        let (store, _dir) = open_store().await;
        let user = seed_author(&store, "ada").await;
        let book = store.create_book(user.id, "B", "").await.unwrap();

        assert!(store.toggle_saved(user.id, book.id).await.unwrap());
        assert_eq!(store.saved_books(user.id).await.len(), 1);
        assert!(!store.toggle_saved(user.id, book.id).await.unwrap());
        assert!(store.saved_books(user.id).await.is_empty());
    }

    #[tokio::test]
    async fn set_saved_is_idempotent() {
        let (store, _dir) = open_store().await;
        let user = seed_author(&store, "ada").await;
        let book = store.create_book(user.id, "B", "").await.unwrap();

        store.set_saved(user.id, book.id, true).await.unwrap();
        store.set_saved(user.id, book.id, true).await.unwrap();
        assert_eq!(store.saved_books(user.id).await.len(), 1);
        store.set_saved(user.id, book.id, false).await.unwrap();
        store.set_saved(user.id, book.id, false).await.unwrap();
        assert!(store.saved_books(user.id).await.is_empty());
    }

    #[tokio::test]
    async fn comments_come_back_newest_first() {
        let (store, _dir) = open_store().await;
        let author = seed_author(&store, "ada").await;
        let book = store.create_book(author.id, "B", "").await.unwrap();
        let chapter = store.create_chapter(book.id, "C", "...").await.unwrap();
        for i in 0..3 {
            store
                .create_comment(chapter.id, author.id, &format!("comment {i}"))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let comments = store.comments_of(chapter.id).await;
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].content, "comment 2");
        assert_eq!(comments[2].content, "comment 0");
    }

    #[tokio::test]
    async fn concurrent_increments_are_never_lost() {
        let (store, _dir) = open_store().await;
        let author = seed_author(&store, "ada").await;
        let book = store.create_book(author.id, "B", "").await.unwrap();

        let store = Arc::new(store);
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            let id = book.id;
            handles.push(tokio::spawn(async move {
                store.increment_views(id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.book(book.id).await.unwrap().views, 50);
    }

    #[tokio::test]
    async fn overlapping_persists_never_fail_a_valid_mutation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fable.json");
        let store = Store::open(&path).await.unwrap();
        let author = seed_author(&store, "ada").await;
        let book = store.create_book(author.id, "B", "").await.unwrap();

        // Every call must come back Ok even when their persists overlap;
        // a lost rename race surfacing as Internal is the failure mode
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for _ in 0..100 {
            let store = Arc::clone(&store);
            let id = book.id;
            handles.push(tokio::spawn(
                async move { store.increment_views(id).await },
            ));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(store.book(book.id).await.unwrap().views, 100);

        // The snapshot on disk is whole and current
        let reopened = Store::open(&path).await.unwrap();
        assert_eq!(reopened.book(book.id).await.unwrap().views, 100);
    }

    #[tokio::test]
    async fn concurrent_registrations_all_succeed() {
        let (store, _dir) = open_store().await;

        let store = Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create_user(&format!("user-{i}"), "hash".to_owned()).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn increment_on_a_missing_book_is_a_quiet_noop() {
        let (store, _dir) = open_store().await;
        assert!(store
            .increment_views(crate::entities::new_id())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn tables_survive_a_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fable.json");

        let (author_id, book_id) = {
            let store = Store::open(&path).await.unwrap();
            let author = store.create_user("ada", "hash".to_owned()).await.unwrap();
            let book = store.create_book(author.id, "B", "desc").await.unwrap();
            store.increment_views(book.id).await.unwrap();
            (author.id, book.id)
        };

        let store = Store::open(&path).await.unwrap();
        assert_eq!(store.user(author_id).await.unwrap().username, "ada");
        let book = store.book(book_id).await.unwrap();
        assert_eq!(book.views, 1);
        assert_eq!(book.description, "desc");
    }
}
