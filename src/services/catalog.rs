//! Catalog home page counts

use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};
use indexmap::IndexMap;

use super::aggregate::{Aggregator, Operation};
use crate::{
    error::AppResult,
    models::BookStatus,
    repository::{
        AuthorFilter, BookFilter, BookInstanceFilter, Collection, Document, GenreFilter, Repository,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    aggregator: Aggregator,
}

impl CatalogService {
    pub fn new(repository: Repository, aggregator: Aggregator) -> Self {
        Self {
            repository,
            aggregator,
        }
    }

    /// Entity counts keyed `book_count`, `book_instance_count`,
    /// `book_instance_available_count`, `author_count` and `genre_count`,
    /// in that order.
    pub async fn counts(&self) -> AppResult<IndexMap<&'static str, i64>> {
        let repo = &self.repository;
        let operations: Vec<Operation<'static, i64>> = vec![
            ("book_count", count(repo.books.clone(), BookFilter::All)),
            (
                "book_instance_count",
                count(repo.book_instances.clone(), BookInstanceFilter::All),
            ),
            (
                "book_instance_available_count",
                count(
                    repo.book_instances.clone(),
                    BookInstanceFilter::Status(BookStatus::Available),
                ),
            ),
            ("author_count", count(repo.authors.clone(), AuthorFilter::All)),
            ("genre_count", count(repo.genres.clone(), GenreFilter::All)),
        ];

        let counts = self.aggregator.aggregate(operations).await?;
        tracing::debug!("catalog counts: {:?}", counts);
        Ok(counts)
    }
}

fn count<E: Document>(
    collection: Arc<dyn Collection<E>>,
    filter: E::Filter,
) -> BoxFuture<'static, AppResult<i64>> {
    async move { collection.count(&filter).await }.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorFields, BookFields, BookInstanceFields, GenreFields};

    #[tokio::test]
    async fn test_counts_by_name() {
        let repository = Repository::in_memory();
        let service = CatalogService::new(repository.clone(), Aggregator::default());

        let author = repository
            .authors
            .insert(AuthorFields {
                first_name: "Frank".into(),
                family_name: "Herbert".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        repository
            .genres
            .insert(GenreFields { name: "Science Fiction".into() })
            .await
            .unwrap();
        let book = repository
            .books
            .insert(BookFields {
                title: "Dune".into(),
                author: author.id,
                summary: "Spice.".into(),
                isbn: "9780441013593".into(),
                genre: vec![],
            })
            .await
            .unwrap();
        for status in [BookStatus::Available, BookStatus::Loaned, BookStatus::Available] {
            repository
                .book_instances
                .insert(BookInstanceFields {
                    book: book.id,
                    imprint: "Ace".into(),
                    status,
                    due_back: None,
                })
                .await
                .unwrap();
        }

        let counts = service.counts().await.unwrap();
        let keys: Vec<_> = counts.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                "book_count",
                "book_instance_count",
                "book_instance_available_count",
                "author_count",
                "genre_count",
            ]
        );
        assert_eq!(counts["book_count"], 1);
        assert_eq!(counts["book_instance_count"], 3);
        assert_eq!(counts["book_instance_available_count"], 2);
        assert_eq!(counts["author_count"], 1);
        assert_eq!(counts["genre_count"], 1);
    }
}
