//! Book instances (copies) service

use std::collections::HashMap;

use uuid::Uuid;

use super::{aggregate::Aggregator, guard::DeleteGuard, DeleteOutcome, FormOutcome};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInstance, BookInstanceDraft, BookInstanceFields, BookInstanceForm, EntityKind},
    repository::{BookFilter, BookInstanceFilter, Repository, Sort},
    services::guard::DeleteCheck,
    validation::{FieldError, Validated},
};

/// A copy with its book resolved
#[derive(Debug, Clone)]
pub struct BookInstanceEntry {
    pub instance: BookInstance,
    /// `None` when the referenced book no longer exists
    pub book: Option<Book>,
}

/// Books to pick from, plus the copy being edited if any
#[derive(Debug, Clone)]
pub struct BookInstanceFormContext {
    pub books: Vec<Book>,
    pub instance: Option<BookInstanceDraft>,
}

#[derive(Clone)]
pub struct BookInstancesService {
    repository: Repository,
    aggregator: Aggregator,
    guard: DeleteGuard,
}

impl BookInstancesService {
    pub fn new(repository: Repository, aggregator: Aggregator, guard: DeleteGuard) -> Self {
        Self {
            repository,
            aggregator,
            guard,
        }
    }

    /// All copies, each joined with its book
    pub async fn list(&self) -> AppResult<Vec<BookInstanceEntry>> {
        let (instances, books) = self
            .aggregator
            .join2(
                self.repository
                    .book_instances
                    .find_many(&BookInstanceFilter::All, Sort::Unsorted),
                self.repository.books.find_many(&BookFilter::All, Sort::Unsorted),
            )
            .await?;

        let books: HashMap<Uuid, Book> = books.into_iter().map(|b| (b.id, b)).collect();
        Ok(instances
            .into_iter()
            .map(|instance| BookInstanceEntry {
                book: books.get(&instance.book).cloned(),
                instance,
            })
            .collect())
    }

    pub async fn detail(&self, id: Uuid) -> AppResult<BookInstanceEntry> {
        let instance = self
            .repository
            .book_instances
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let book = self.repository.books.find_by_id(instance.book).await?;
        Ok(BookInstanceEntry { instance, book })
    }

    pub async fn create_form(&self) -> AppResult<BookInstanceFormContext> {
        self.form_context(None).await
    }

    pub async fn create(
        &self,
        form: &BookInstanceForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormContext>> {
        let fields = match self.checked_fields(form).await? {
            Ok(fields) => fields,
            Err(invalid) => return Ok(invalid),
        };

        let instance = self.repository.book_instances.insert(fields).await?;
        tracing::info!("created book copy {} of book {}", instance.id, instance.book);
        Ok(FormOutcome::Saved(instance))
    }

    pub async fn delete_form(&self, id: Uuid) -> AppResult<BookInstanceEntry> {
        self.detail(id).await
    }

    /// Copies have no dependents, so the guard always allows this.
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<BookInstance, ()>> {
        let (instance, check) = self
            .aggregator
            .join2(
                self.repository.book_instances.find_by_id(id),
                self.guard.can_delete(EntityKind::BookInstance, id),
            )
            .await?;
        let instance = instance.ok_or_else(|| not_found(id))?;

        match check {
            DeleteCheck::Blocked(_) => Ok(DeleteOutcome::Blocked {
                entity: instance,
                dependents: Vec::new(),
            }),
            DeleteCheck::Allowed => {
                if !self.repository.book_instances.delete_by_id(id).await? {
                    return Err(not_found(id));
                }
                tracing::info!("deleted book copy {}", id);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    pub async fn update_form(&self, id: Uuid) -> AppResult<BookInstanceFormContext> {
        let instance = self
            .repository
            .book_instances
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        self.form_context(Some(instance.draft())).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        form: &BookInstanceForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormContext>> {
        if self.repository.book_instances.find_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }

        let fields = match self.checked_fields(form).await? {
            Ok(fields) => fields,
            Err(invalid) => return Ok(invalid),
        };

        let instance = self
            .repository
            .book_instances
            .update_by_id(id, fields)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("updated book copy {}", id);
        Ok(FormOutcome::Saved(instance))
    }

    async fn checked_fields(
        &self,
        form: &BookInstanceForm,
    ) -> AppResult<Result<BookInstanceFields, FormOutcome<BookInstance, BookInstanceFormContext>>>
    {
        let fields = match form.validate() {
            Validated::Clean(fields) => fields,
            Validated::Rejected { draft, errors } => {
                tracing::warn!("book copy form rejected with {} error(s)", errors.len());
                return self.invalid(draft, errors).await.map(Err);
            }
        };

        if self.repository.books.find_by_id(fields.book).await?.is_none() {
            tracing::warn!("book copy form references missing book {}", fields.book);
            let errors = vec![FieldError::new("book", "Book not found")];
            return self.invalid(fields.into(), errors).await.map(Err);
        }
        Ok(Ok(fields))
    }

    async fn invalid(
        &self,
        draft: BookInstanceDraft,
        errors: Vec<FieldError>,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormContext>> {
        let form = self.form_context(Some(draft)).await?;
        Ok(FormOutcome::Invalid { form, errors })
    }

    async fn form_context(
        &self,
        instance: Option<BookInstanceDraft>,
    ) -> AppResult<BookInstanceFormContext> {
        let books = self
            .repository
            .books
            .find_many(&BookFilter::All, Sort::Unsorted)
            .await?;
        Ok(BookInstanceFormContext { books, instance })
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book copy {} not found", id))
}
