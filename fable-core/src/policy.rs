//! The ownership policy
//!
//! A pure decision function: given an actor and a target resource with its
//! ownership chain already resolved from storage (never from client input),
//! decide whether a mutation is permitted. Total and side-effect-free so it
//! can be unit-tested against a matrix of (actor, owner) pairs independent
//! of storage.

use uuid::Uuid;

use crate::entities::{Book, Comment};
use crate::error::{FableError, Result};

/// The mutation being attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Edit,
    Delete,
}

/// The target resource, with its ownership chain resolved
///
/// A chapter is represented by its resolved parent book: chapter ownership
/// is entirely the parent book author's, so the book is the whole chain.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Book(&'a Book),
    Chapter { book: &'a Book },
    Comment(&'a Comment),
}

/// Decide whether `actor` may perform `op` on `resource`
///
/// Reads are public and never reach this function.
pub fn authorize(actor: Uuid, op: Operation, resource: Resource<'_>) -> Result<()> {
    match (op, resource) {
        // Creating a book or a comment claims no existing resource
        (Operation::Create, Resource::Book(_)) => Ok(()),
        (Operation::Create, Resource::Comment(_)) => Ok(()),

        (Operation::Edit | Operation::Delete, Resource::Book(book)) => {
            if actor == book.author_id {
                Ok(())
            } else {
                Err(FableError::Forbidden("only the author may modify a book"))
            }
        }

        // Chapters belong to the parent book's author, for creation too
        (_, Resource::Chapter { book }) => {
            if actor == book.author_id {
                Ok(())
            } else {
                Err(FableError::Forbidden(
                    "only the book's author may modify its chapters",
                ))
            }
        }

        (Operation::Delete, Resource::Comment(comment)) => {
            if actor == comment.author_id {
                Ok(())
            } else {
                Err(FableError::Forbidden(
                    "only the comment's author may delete it",
                ))
            }
        }

        // Comment editing is not supported
        (Operation::Edit, Resource::Comment(_)) => {
            Err(FableError::Forbidden("comments cannot be edited"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{new_id, Chapter};

    fn fixtures() -> (Uuid, Uuid, Book, Chapter, Comment) {
        let author = new_id();
        let stranger = new_id();
        let book = Book::new(author, "Owned Book", "");
        let chapter = Chapter::new(book.id, "Ch 1", "...");
        let comment = Comment::new(chapter.id, stranger, "nice");
        (author, stranger, book, chapter, comment)
    }

    #[test]
    fn author_may_modify_own_book() {
        let (author, _, book, _, _) = fixtures();
        assert!(authorize(author, Operation::Edit, Resource::Book(&book)).is_ok());
        assert!(authorize(author, Operation::Delete, Resource::Book(&book)).is_ok());
    }

    #[test]
    fn non_owner_is_denied_on_book_and_chapters() {
        let (_, stranger, book, _, _) = fixtures();
        for op in [Operation::Edit, Operation::Delete] {
            assert!(matches!(
                authorize(stranger, op, Resource::Book(&book)),
                Err(FableError::Forbidden(_))
            ));
            assert!(matches!(
                authorize(stranger, op, Resource::Chapter { book: &book }),
                Err(FableError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn anyone_may_create_books_and_comments() {
        let (_, stranger, book, _, comment) = fixtures();
        assert!(authorize(stranger, Operation::Create, Resource::Book(&book)).is_ok());
        assert!(authorize(stranger, Operation::Create, Resource::Comment(&comment)).is_ok());
    }

    #[test]
    fn chapter_creation_requires_book_ownership() {
        let (author, stranger, book, _, _) = fixtures();
        assert!(authorize(author, Operation::Create, Resource::Chapter { book: &book }).is_ok());
        assert!(
            authorize(stranger, Operation::Create, Resource::Chapter { book: &book }).is_err()
        );
    }

    #[test]
    fn comment_deletion_is_author_only() {
        let (author, stranger, _, _, comment) = fixtures();
        // `stranger` wrote the comment in the fixtures
        assert!(authorize(stranger, Operation::Delete, Resource::Comment(&comment)).is_ok());
        assert!(authorize(author, Operation::Delete, Resource::Comment(&comment)).is_err());
    }

    #[test]
    fn comment_editing_is_unsupported_even_for_author() {
        let (_, stranger, _, _, comment) = fixtures();
        assert!(matches!(
            authorize(stranger, Operation::Edit, Resource::Comment(&comment)),
            Err(FableError::Forbidden(_))
        ));
    }
}
