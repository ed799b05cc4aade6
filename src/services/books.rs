//! Books service

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::{aggregate::Aggregator, guard::DeleteGuard, DeleteOutcome, FormOutcome};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookDraft, BookFields, BookForm, BookInstance, EntityKind, Genre},
    repository::{AuthorFilter, BookFilter, GenreFilter, Repository, Sort},
    services::guard::DeleteCheck,
    validation::{FieldError, Validated},
};

/// A book row on the list page
#[derive(Debug, Clone)]
pub struct BookListEntry {
    pub book: Book,
    /// `None` when the referenced author no longer exists
    pub author: Option<Author>,
}

/// A book with its author, genres and copies resolved
#[derive(Debug, Clone)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<Author>,
    pub genres: Vec<Genre>,
    pub instances: Vec<BookInstance>,
}

/// A genre offered on the book form, checked when the book carries it
#[derive(Debug, Clone, Serialize)]
pub struct GenreChoice {
    #[serde(flatten)]
    pub genre: Genre,
    pub checked: bool,
}

/// Reference data for the book form, plus the book being edited if any
#[derive(Debug, Clone)]
pub struct BookFormContext {
    pub authors: Vec<Author>,
    pub genres: Vec<GenreChoice>,
    pub book: Option<BookDraft>,
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    aggregator: Aggregator,
    guard: DeleteGuard,
}

impl BooksService {
    pub fn new(repository: Repository, aggregator: Aggregator, guard: DeleteGuard) -> Self {
        Self {
            repository,
            aggregator,
            guard,
        }
    }

    /// All books, each joined with its author
    pub async fn list(&self) -> AppResult<Vec<BookListEntry>> {
        let (books, authors) = self
            .aggregator
            .join2(
                self.repository.books.find_many(&BookFilter::All, Sort::Unsorted),
                self.repository.authors.find_many(&AuthorFilter::All, Sort::Unsorted),
            )
            .await?;

        let authors: HashMap<Uuid, Author> =
            authors.into_iter().map(|a| (a.id, a)).collect();
        Ok(books
            .into_iter()
            .map(|book| BookListEntry {
                author: authors.get(&book.author).cloned(),
                book,
            })
            .collect())
    }

    /// Book plus its copies, then its author and genres.
    pub async fn detail(&self, id: Uuid) -> AppResult<BookDetail> {
        let (book, dependents) = self
            .aggregator
            .join2(
                self.repository.books.find_by_id(id),
                self.guard.dependents(EntityKind::Book, id),
            )
            .await?;
        let book = book.ok_or_else(|| not_found(id))?;

        let (author, genres) = self
            .aggregator
            .join2(
                self.repository.authors.find_by_id(book.author),
                self.genres_of(&book.genre),
            )
            .await?;

        Ok(BookDetail {
            book,
            author,
            genres,
            instances: dependents.into_book_instances(),
        })
    }

    /// Authors and genres to pick from on an empty form
    pub async fn create_form(&self) -> AppResult<BookFormContext> {
        self.form_context(None).await
    }

    pub async fn create(&self, form: &BookForm) -> AppResult<FormOutcome<Book, BookFormContext>> {
        let fields = match self.checked_fields(form).await? {
            Ok(fields) => fields,
            Err(invalid) => return Ok(invalid),
        };

        let book = self.repository.books.insert(fields).await?;
        tracing::info!("created book {} ({})", book.id, book.title);
        Ok(FormOutcome::Saved(book))
    }

    pub async fn delete_form(&self, id: Uuid) -> AppResult<BookDetail> {
        self.detail(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<Book, BookInstance>> {
        let (book, check) = self
            .aggregator
            .join2(
                self.repository.books.find_by_id(id),
                self.guard.can_delete(EntityKind::Book, id),
            )
            .await?;
        let book = book.ok_or_else(|| not_found(id))?;

        match check {
            DeleteCheck::Blocked(dependents) => Ok(DeleteOutcome::Blocked {
                entity: book,
                dependents: dependents.into_book_instances(),
            }),
            DeleteCheck::Allowed => {
                if !self.repository.books.delete_by_id(id).await? {
                    return Err(not_found(id));
                }
                tracing::info!("deleted book {}", id);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    /// Reference data with the existing book preselected
    pub async fn update_form(&self, id: Uuid) -> AppResult<BookFormContext> {
        let book = self
            .repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        self.form_context(Some(book.draft())).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        form: &BookForm,
    ) -> AppResult<FormOutcome<Book, BookFormContext>> {
        if self.repository.books.find_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }

        let fields = match self.checked_fields(form).await? {
            Ok(fields) => fields,
            Err(invalid) => return Ok(invalid),
        };

        let book = self
            .repository
            .books
            .update_by_id(id, fields)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("updated book {}", id);
        Ok(FormOutcome::Saved(book))
    }

    /// Validate the form and confirm that the author and every genre exist.
    ///
    /// The inner `Err` is the outcome to hand back when the form must be shown
    /// again.
    async fn checked_fields(
        &self,
        form: &BookForm,
    ) -> AppResult<Result<BookFields, FormOutcome<Book, BookFormContext>>> {
        let (fields, mut errors) = match form.validate() {
            Validated::Clean(fields) => (fields, Vec::new()),
            Validated::Rejected { draft, errors } => {
                tracing::warn!("book form rejected with {} error(s)", errors.len());
                return self.invalid(draft, errors).await.map(Err);
            }
        };

        let (author, genres) = self
            .aggregator
            .join2(
                self.repository.authors.find_by_id(fields.author),
                self.genres_of(&fields.genre),
            )
            .await?;
        if author.is_none() {
            errors.push(FieldError::new("author", "Author not found"));
        }
        if genres.len() != fields.genre.len() {
            errors.push(FieldError::new("genre", "Genre not found"));
        }

        if errors.is_empty() {
            Ok(Ok(fields))
        } else {
            tracing::warn!("book form references missing entities");
            self.invalid(BookDraft::from(fields), errors).await.map(Err)
        }
    }

    async fn invalid(
        &self,
        draft: BookDraft,
        errors: Vec<FieldError>,
    ) -> AppResult<FormOutcome<Book, BookFormContext>> {
        let form = self.form_context(Some(draft)).await?;
        Ok(FormOutcome::Invalid { form, errors })
    }

    async fn form_context(&self, book: Option<BookDraft>) -> AppResult<BookFormContext> {
        let (authors, genres) = self
            .aggregator
            .join2(
                self.repository.authors.find_many(&AuthorFilter::All, Sort::Natural),
                self.repository.genres.find_many(&GenreFilter::All, Sort::Natural),
            )
            .await?;

        let selected: &[Uuid] = book.as_ref().map(|b| b.genre.as_slice()).unwrap_or(&[]);
        let genres = genres
            .into_iter()
            .map(|genre| GenreChoice {
                checked: selected.contains(&genre.id),
                genre,
            })
            .collect();

        Ok(BookFormContext {
            authors,
            genres,
            book,
        })
    }

    async fn genres_of(&self, ids: &[Uuid]) -> AppResult<Vec<Genre>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.repository
            .genres
            .find_many(&GenreFilter::Ids(ids.to_vec()), Sort::Natural)
            .await
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}
