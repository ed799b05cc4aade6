//! Repository layer: the document store the catalog consumes.
//!
//! Each entity kind is a collection behind the [`Collection`] trait. The store
//! does not know about references between kinds; dependents are found with
//! filtered queries and guarded by the service layer.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod memory;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorFields},
        book::{Book, BookFields},
        book_instance::{BookInstance, BookInstanceFields, BookStatus},
        genre::{normalize_name, Genre, GenreFields},
        EntityKind,
    },
};

/// A stored catalog entity
pub trait Document: Clone + Send + Sync + 'static {
    /// Field set accepted by insert and update
    type Fields: Send + Sync + 'static;
    /// Query filter understood by the collection
    type Filter: Send + Sync + 'static;

    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    fn from_fields(id: Uuid, fields: Self::Fields) -> Self;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Ordering used for [`Sort::Natural`]
    fn natural_cmp(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}

/// Result ordering for `find_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    /// Store order
    #[default]
    Unsorted,
    /// The kind's natural key (Author by family name, Genre by name)
    Natural,
}

/// Generic document store operations for one entity kind
#[async_trait]
pub trait Collection<E: Document>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<E>>;

    async fn find_one(&self, filter: &E::Filter) -> AppResult<Option<E>>;

    async fn find_many(&self, filter: &E::Filter, sort: Sort) -> AppResult<Vec<E>>;

    async fn count(&self, filter: &E::Filter) -> AppResult<i64>;

    async fn insert(&self, fields: E::Fields) -> AppResult<E>;

    /// Replace the fields of `id`; `None` when no such document
    async fn update_by_id(&self, id: Uuid, fields: E::Fields) -> AppResult<Option<E>>;

    /// Remove `id`; `false` when no such document
    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub enum AuthorFilter {
    All,
}

#[derive(Debug, Clone)]
pub enum GenreFilter {
    All,
    /// Case-insensitive match on the trimmed name
    Name(String),
    Ids(Vec<Uuid>),
}

#[derive(Debug, Clone)]
pub enum BookFilter {
    All,
    Author(Uuid),
    /// Books whose genre set contains the id
    Genre(Uuid),
}

#[derive(Debug, Clone)]
pub enum BookInstanceFilter {
    All,
    Book(Uuid),
    Status(BookStatus),
}

impl Document for Author {
    type Fields = AuthorFields;
    type Filter = AuthorFilter;

    const KIND: EntityKind = EntityKind::Author;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_fields(id: Uuid, fields: AuthorFields) -> Self {
        Author::from_fields(id, fields)
    }

    fn matches(&self, filter: &AuthorFilter) -> bool {
        match filter {
            AuthorFilter::All => true,
        }
    }

    fn natural_cmp(&self, other: &Self) -> Ordering {
        self.family_name.cmp(&other.family_name)
    }
}

impl Document for Genre {
    type Fields = GenreFields;
    type Filter = GenreFilter;

    const KIND: EntityKind = EntityKind::Genre;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_fields(id: Uuid, fields: GenreFields) -> Self {
        Genre::from_fields(id, fields)
    }

    fn matches(&self, filter: &GenreFilter) -> bool {
        match filter {
            GenreFilter::All => true,
            GenreFilter::Name(name) => normalize_name(&self.name) == normalize_name(name),
            GenreFilter::Ids(ids) => ids.contains(&self.id),
        }
    }

    fn natural_cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Document for Book {
    type Fields = BookFields;
    type Filter = BookFilter;

    const KIND: EntityKind = EntityKind::Book;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_fields(id: Uuid, fields: BookFields) -> Self {
        Book::from_fields(id, fields)
    }

    fn matches(&self, filter: &BookFilter) -> bool {
        match filter {
            BookFilter::All => true,
            BookFilter::Author(author) => self.author == *author,
            BookFilter::Genre(genre) => self.has_genre(*genre),
        }
    }
}

impl Document for BookInstance {
    type Fields = BookInstanceFields;
    type Filter = BookInstanceFilter;

    const KIND: EntityKind = EntityKind::BookInstance;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_fields(id: Uuid, fields: BookInstanceFields) -> Self {
        BookInstance::from_fields(id, fields)
    }

    fn matches(&self, filter: &BookInstanceFilter) -> bool {
        match filter {
            BookInstanceFilter::All => true,
            BookInstanceFilter::Book(book) => self.book == *book,
            BookInstanceFilter::Status(status) => self.status == *status,
        }
    }
}

/// Main repository struct holding one collection per entity kind
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn Collection<Author>>,
    pub genres: Arc<dyn Collection<Genre>>,
    pub books: Arc<dyn Collection<Book>>,
    pub book_instances: Arc<dyn Collection<BookInstance>>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::AuthorsRepository::new(pool.clone())),
            genres: Arc::new(genres::GenresRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            book_instances: Arc::new(book_instances::BookInstancesRepository::new(pool)),
        }
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        Self {
            authors: Arc::new(memory::MemoryCollection::<Author>::new()),
            genres: Arc::new(memory::MemoryCollection::<Genre>::new()),
            books: Arc::new(memory::MemoryCollection::<Book>::new()),
            book_instances: Arc::new(memory::MemoryCollection::<BookInstance>::new()),
        }
    }
}
