//! Referential integrity guard.
//!
//! The store has no foreign keys, so before anything is deleted the guard
//! looks up every document that still references it:
//!
//! | deleting     | blocked by                      |
//! |--------------|---------------------------------|
//! | Author       | Books with `author == id`       |
//! | Genre        | Books whose `genre` contains id |
//! | Book         | BookInstances with `book == id` |
//! | BookInstance | nothing                         |
//!
//! The check and the delete that follows are separate store operations.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookInstance, EntityKind},
    repository::{BookFilter, BookInstanceFilter, Repository, Sort},
};

/// Documents that reference the entity being deleted
#[derive(Debug, Clone, PartialEq)]
pub enum Dependents {
    None,
    Books(Vec<Book>),
    BookInstances(Vec<BookInstance>),
}

impl Dependents {
    pub fn len(&self) -> usize {
        match self {
            Dependents::None => 0,
            Dependents::Books(books) => books.len(),
            Dependents::BookInstances(instances) => instances.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_books(self) -> Vec<Book> {
        match self {
            Dependents::Books(books) => books,
            _ => Vec::new(),
        }
    }

    pub fn into_book_instances(self) -> Vec<BookInstance> {
        match self {
            Dependents::BookInstances(instances) => instances,
            _ => Vec::new(),
        }
    }
}

/// Verdict of a delete check
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteCheck {
    Allowed,
    Blocked(Dependents),
}

#[derive(Clone)]
pub struct DeleteGuard {
    repository: Repository,
}

impl DeleteGuard {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every document of the dependent kind that references `id`
    pub async fn dependents(&self, kind: EntityKind, id: Uuid) -> AppResult<Dependents> {
        let dependents = match kind {
            EntityKind::Author => Dependents::Books(
                self.repository
                    .books
                    .find_many(&BookFilter::Author(id), Sort::Unsorted)
                    .await?,
            ),
            EntityKind::Genre => Dependents::Books(
                self.repository
                    .books
                    .find_many(&BookFilter::Genre(id), Sort::Unsorted)
                    .await?,
            ),
            EntityKind::Book => Dependents::BookInstances(
                self.repository
                    .book_instances
                    .find_many(&BookInstanceFilter::Book(id), Sort::Unsorted)
                    .await?,
            ),
            EntityKind::BookInstance => Dependents::None,
        };
        Ok(dependents)
    }

    /// Allowed when nothing references `id`; otherwise the full dependent set.
    pub async fn can_delete(&self, kind: EntityKind, id: Uuid) -> AppResult<DeleteCheck> {
        let dependents = self.dependents(kind, id).await?;
        if dependents.is_empty() {
            Ok(DeleteCheck::Allowed)
        } else {
            tracing::warn!(
                "delete of {} {} blocked by {} dependent(s)",
                kind,
                id,
                dependents.len()
            );
            Ok(DeleteCheck::Blocked(dependents))
        }
    }
}
