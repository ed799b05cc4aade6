//! Authors service

use uuid::Uuid;

use super::{aggregate::Aggregator, guard::DeleteGuard, DeleteOutcome, FormOutcome};
use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorFields, AuthorForm, Book, EntityKind},
    repository::{AuthorFilter, Repository, Sort},
    services::guard::DeleteCheck,
    validation::Validated,
};

/// An author together with the books that reference it
#[derive(Debug, Clone)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<Book>,
}

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    aggregator: Aggregator,
    guard: DeleteGuard,
}

impl AuthorsService {
    pub fn new(repository: Repository, aggregator: Aggregator, guard: DeleteGuard) -> Self {
        Self {
            repository,
            aggregator,
            guard,
        }
    }

    /// All authors by family name
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.repository
            .authors
            .find_many(&AuthorFilter::All, Sort::Natural)
            .await
    }

    /// Author plus every book written by it
    pub async fn detail(&self, id: Uuid) -> AppResult<AuthorDetail> {
        let (author, dependents) = self
            .aggregator
            .join2(
                self.repository.authors.find_by_id(id),
                self.guard.dependents(EntityKind::Author, id),
            )
            .await?;

        let author = author.ok_or_else(|| not_found(id))?;
        Ok(AuthorDetail {
            author,
            books: dependents.into_books(),
        })
    }

    pub async fn create(&self, form: &AuthorForm) -> AppResult<FormOutcome<Author, AuthorFields>> {
        match form.validate() {
            Validated::Clean(fields) => {
                let author = self.repository.authors.insert(fields).await?;
                tracing::info!("created author {} ({})", author.id, author.name());
                Ok(FormOutcome::Saved(author))
            }
            Validated::Rejected { draft, errors } => {
                tracing::warn!("author form rejected with {} error(s)", errors.len());
                Ok(FormOutcome::Invalid { form: draft, errors })
            }
        }
    }

    /// Same data as the detail page, so the confirmation can list the blocking books
    pub async fn delete_form(&self, id: Uuid) -> AppResult<AuthorDetail> {
        self.detail(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<Author, Book>> {
        let (author, check) = self
            .aggregator
            .join2(
                self.repository.authors.find_by_id(id),
                self.guard.can_delete(EntityKind::Author, id),
            )
            .await?;
        let author = author.ok_or_else(|| not_found(id))?;

        match check {
            DeleteCheck::Blocked(dependents) => Ok(DeleteOutcome::Blocked {
                entity: author,
                dependents: dependents.into_books(),
            }),
            DeleteCheck::Allowed => {
                if !self.repository.authors.delete_by_id(id).await? {
                    return Err(not_found(id));
                }
                tracing::info!("deleted author {}", id);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    /// Existing author used to prefill the update form
    pub async fn update_form(&self, id: Uuid) -> AppResult<Author> {
        self.repository
            .authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn update(
        &self,
        id: Uuid,
        form: &AuthorForm,
    ) -> AppResult<FormOutcome<Author, AuthorFields>> {
        match form.validate() {
            Validated::Clean(fields) => {
                let author = self
                    .repository
                    .authors
                    .update_by_id(id, fields)
                    .await?
                    .ok_or_else(|| not_found(id))?;
                tracing::info!("updated author {}", id);
                Ok(FormOutcome::Saved(author))
            }
            Validated::Rejected { draft, errors } => {
                tracing::warn!("author {} update rejected with {} error(s)", id, errors.len());
                Ok(FormOutcome::Invalid { form: draft, errors })
            }
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Author {} not found", id))
}
