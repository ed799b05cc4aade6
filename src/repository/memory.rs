//! In-process document store.
//!
//! Keeps documents in insertion order, which stands in for the natural order
//! of a document database. Used for development and by the test suites.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, Document, Sort};
use crate::error::AppResult;

pub struct MemoryCollection<E: Document> {
    documents: RwLock<IndexMap<Uuid, E>>,
}

impl<E: Document> MemoryCollection<E> {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(IndexMap::new()),
        }
    }
}

impl<E: Document> Default for MemoryCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Document> Collection<E> for MemoryCollection<E> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<E>> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn find_one(&self, filter: &E::Filter) -> AppResult<Option<E>> {
        let documents = self.documents.read().await;
        Ok(documents.values().find(|d| d.matches(filter)).cloned())
    }

    async fn find_many(&self, filter: &E::Filter, sort: Sort) -> AppResult<Vec<E>> {
        let mut found: Vec<E> = {
            let documents = self.documents.read().await;
            documents
                .values()
                .filter(|d| d.matches(filter))
                .cloned()
                .collect()
        };
        if sort == Sort::Natural {
            found.sort_by(|a, b| a.natural_cmp(b));
        }
        Ok(found)
    }

    async fn count(&self, filter: &E::Filter) -> AppResult<i64> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|d| d.matches(filter)).count() as i64)
    }

    async fn insert(&self, fields: E::Fields) -> AppResult<E> {
        let document = E::from_fields(Uuid::new_v4(), fields);
        self.documents
            .write()
            .await
            .insert(document.id(), document.clone());
        tracing::debug!("memory store: inserted {} {}", E::KIND, document.id());
        Ok(document)
    }

    async fn update_by_id(&self, id: Uuid, fields: E::Fields) -> AppResult<Option<E>> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&id) {
            Some(slot) => {
                *slot = E::from_fields(id, fields);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        // shift_remove keeps the remaining documents in insertion order
        Ok(self.documents.write().await.shift_remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, GenreFields};
    use crate::repository::GenreFilter;

    fn genre(name: &str) -> GenreFields {
        GenreFields { name: name.into() }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryCollection::<Genre>::new();
        let poetry = store.insert(genre("Poetry")).await.unwrap();

        let found = store.find_by_id(poetry.id).await.unwrap();
        assert_eq!(found, Some(poetry.clone()));

        let by_name = store
            .find_one(&GenreFilter::Name("  poetry ".into()))
            .await
            .unwrap();
        assert_eq!(by_name.map(|g| g.id), Some(poetry.id));
    }

    #[tokio::test]
    async fn test_natural_sort_and_count() {
        let store = MemoryCollection::<Genre>::new();
        for name in ["Thriller", "Fantasy", "Poetry"] {
            store.insert(genre(name)).await.unwrap();
        }

        let unsorted = store.find_many(&GenreFilter::All, Sort::Unsorted).await.unwrap();
        assert_eq!(unsorted[0].name, "Thriller");

        let sorted = store.find_many(&GenreFilter::All, Sort::Natural).await.unwrap();
        let names: Vec<_> = sorted.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Fantasy", "Poetry", "Thriller"]);

        assert_eq!(store.count(&GenreFilter::All).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let store = MemoryCollection::<Genre>::new();
        let missing = Uuid::new_v4();
        assert_eq!(store.update_by_id(missing, genre("x")).await.unwrap(), None);
        assert!(!store.delete_by_id(missing).await.unwrap());

        let g = store.insert(genre("Horror")).await.unwrap();
        let updated = store.update_by_id(g.id, genre("Gothic")).await.unwrap();
        assert_eq!(updated.map(|g| g.name), Some("Gothic".to_string()));
        assert!(store.delete_by_id(g.id).await.unwrap());
        assert_eq!(store.count(&GenreFilter::All).await.unwrap(), 0);
    }
}
