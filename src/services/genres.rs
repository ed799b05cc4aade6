//! Genres service

use uuid::Uuid;

use super::{aggregate::Aggregator, guard::DeleteGuard, DeleteOutcome, FormOutcome};
use crate::{
    error::{AppError, AppResult},
    models::{Book, EntityKind, Genre, GenreFields, GenreForm},
    repository::{GenreFilter, Repository, Sort},
    services::guard::DeleteCheck,
    validation::Validated,
};

/// A genre together with the books filed under it
#[derive(Debug, Clone)]
pub struct GenreDetail {
    pub genre: Genre,
    pub books: Vec<Book>,
}

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
    aggregator: Aggregator,
    guard: DeleteGuard,
}

impl GenresService {
    pub fn new(repository: Repository, aggregator: Aggregator, guard: DeleteGuard) -> Self {
        Self {
            repository,
            aggregator,
            guard,
        }
    }

    /// All genres by name
    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        self.repository
            .genres
            .find_many(&GenreFilter::All, Sort::Natural)
            .await
    }

    pub async fn detail(&self, id: Uuid) -> AppResult<GenreDetail> {
        let (genre, dependents) = self
            .aggregator
            .join2(
                self.repository.genres.find_by_id(id),
                self.guard.dependents(EntityKind::Genre, id),
            )
            .await?;

        let genre = genre.ok_or_else(|| not_found(id))?;
        Ok(GenreDetail {
            genre,
            books: dependents.into_books(),
        })
    }

    /// Create a genre unless one with the same name already exists.
    ///
    /// An existing match is returned as [`FormOutcome::Existing`] and nothing
    /// is written.
    pub async fn create(&self, form: &GenreForm) -> AppResult<FormOutcome<Genre, GenreFields>> {
        let fields = match form.validate() {
            Validated::Clean(fields) => fields,
            Validated::Rejected { draft, errors } => {
                tracing::warn!("genre form rejected with {} error(s)", errors.len());
                return Ok(FormOutcome::Invalid { form: draft, errors });
            }
        };

        if let Some(existing) = self.find_by_name(&fields).await? {
            tracing::debug!("genre '{}' already exists as {}", fields.name, existing.id);
            return Ok(FormOutcome::Existing(existing));
        }

        let genre = self.repository.genres.insert(fields).await?;
        tracing::info!("created genre {} ({})", genre.id, genre.name);
        Ok(FormOutcome::Saved(genre))
    }

    pub async fn delete_form(&self, id: Uuid) -> AppResult<GenreDetail> {
        self.detail(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<Genre, Book>> {
        let (genre, check) = self
            .aggregator
            .join2(
                self.repository.genres.find_by_id(id),
                self.guard.can_delete(EntityKind::Genre, id),
            )
            .await?;
        let genre = genre.ok_or_else(|| not_found(id))?;

        match check {
            DeleteCheck::Blocked(dependents) => Ok(DeleteOutcome::Blocked {
                entity: genre,
                dependents: dependents.into_books(),
            }),
            DeleteCheck::Allowed => {
                if !self.repository.genres.delete_by_id(id).await? {
                    return Err(not_found(id));
                }
                tracing::info!("deleted genre {}", id);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }

    pub async fn update_form(&self, id: Uuid) -> AppResult<Genre> {
        self.repository
            .genres
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Rename a genre. Renaming onto another genre's name resolves to that
    /// genre instead of creating a duplicate.
    pub async fn update(
        &self,
        id: Uuid,
        form: &GenreForm,
    ) -> AppResult<FormOutcome<Genre, GenreFields>> {
        let fields = match form.validate() {
            Validated::Clean(fields) => fields,
            Validated::Rejected { draft, errors } => {
                tracing::warn!("genre {} update rejected with {} error(s)", id, errors.len());
                return Ok(FormOutcome::Invalid { form: draft, errors });
            }
        };

        if let Some(existing) = self.find_by_name(&fields).await? {
            if existing.id != id {
                tracing::debug!("genre '{}' already exists as {}", fields.name, existing.id);
                return Ok(FormOutcome::Existing(existing));
            }
        }

        let genre = self
            .repository
            .genres
            .update_by_id(id, fields)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("updated genre {}", id);
        Ok(FormOutcome::Saved(genre))
    }

    async fn find_by_name(&self, fields: &GenreFields) -> AppResult<Option<Genre>> {
        self.repository
            .genres
            .find_one(&GenreFilter::Name(fields.normalized_name()))
            .await
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Genre {} not found", id))
}
