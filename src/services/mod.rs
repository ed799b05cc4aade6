//! Business logic services

pub mod aggregate;
pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod guard;

use crate::{config::CatalogConfig, repository::Repository, validation::FieldError};

use aggregate::Aggregator;
use guard::DeleteGuard;

/// Outcome of a create or update submission
#[derive(Debug, Clone)]
pub enum FormOutcome<E, C> {
    /// The entity was written
    Saved(E),
    /// An equivalent entity already exists and nothing was written
    Existing(E),
    /// Validation failed; `form` holds what is needed to show the form again
    Invalid { form: C, errors: Vec<FieldError> },
}

/// Outcome of a delete request
#[derive(Debug, Clone)]
pub enum DeleteOutcome<E, D> {
    Deleted,
    /// Dependents still reference the entity; nothing was removed
    Blocked { entity: E, dependents: Vec<D> },
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
    pub books: books::BooksService,
    pub book_instances: book_instances::BookInstancesService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, config: &CatalogConfig) -> Self {
        let aggregator = Aggregator::new(config.aggregate_timeout());
        let guard = DeleteGuard::new(repository.clone());

        Self {
            catalog: catalog::CatalogService::new(repository.clone(), aggregator),
            authors: authors::AuthorsService::new(repository.clone(), aggregator, guard.clone()),
            genres: genres::GenresService::new(repository.clone(), aggregator, guard.clone()),
            books: books::BooksService::new(repository.clone(), aggregator, guard.clone()),
            book_instances: book_instances::BookInstancesService::new(repository, aggregator, guard),
        }
    }
}
