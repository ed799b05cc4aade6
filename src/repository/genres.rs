//! Genres repository for database operations

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::{Collection, GenreFilter, Sort};
use crate::{
    error::AppResult,
    models::genre::{normalize_name, Genre, GenreFields},
};

fn row_to_genre(row: &PgRow) -> Genre {
    Genre {
        id: row.get("id"),
        name: row.get("name"),
    }
}

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn select(&self, filter: &GenreFilter, tail: &str) -> AppResult<Vec<PgRow>> {
        let rows = match filter {
            GenreFilter::All => {
                sqlx::query(&format!("SELECT id, name FROM genres{}", tail))
                    .fetch_all(&self.pool)
                    .await?
            }
            GenreFilter::Name(name) => {
                sqlx::query(&format!(
                    "SELECT id, name FROM genres WHERE LOWER(TRIM(name)) = $1{}",
                    tail
                ))
                .bind(normalize_name(name))
                .fetch_all(&self.pool)
                .await?
            }
            GenreFilter::Ids(ids) => {
                sqlx::query(&format!("SELECT id, name FROM genres WHERE id = ANY($1){}", tail))
                    .bind(ids)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl Collection<Genre> for GenresRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Genre>> {
        let row = sqlx::query("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_genre))
    }

    async fn find_one(&self, filter: &GenreFilter) -> AppResult<Option<Genre>> {
        let rows = self.select(filter, " LIMIT 1").await?;
        Ok(rows.first().map(row_to_genre))
    }

    async fn find_many(&self, filter: &GenreFilter, sort: Sort) -> AppResult<Vec<Genre>> {
        let order = match sort {
            Sort::Natural => " ORDER BY name ASC",
            Sort::Unsorted => "",
        };
        let rows = self.select(filter, order).await?;
        Ok(rows.iter().map(row_to_genre).collect())
    }

    async fn count(&self, filter: &GenreFilter) -> AppResult<i64> {
        let count = match filter {
            GenreFilter::All => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM genres")
                    .fetch_one(&self.pool)
                    .await?
            }
            GenreFilter::Name(name) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM genres WHERE LOWER(TRIM(name)) = $1",
                )
                .bind(normalize_name(name))
                .fetch_one(&self.pool)
                .await?
            }
            GenreFilter::Ids(ids) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM genres WHERE id = ANY($1)")
                    .bind(ids)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    async fn insert(&self, fields: GenreFields) -> AppResult<Genre> {
        let row = sqlx::query("INSERT INTO genres (id, name) VALUES ($1, $2) RETURNING id, name")
            .bind(Uuid::new_v4())
            .bind(&fields.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row_to_genre(&row))
    }

    async fn update_by_id(&self, id: Uuid, fields: GenreFields) -> AppResult<Option<Genre>> {
        let row = sqlx::query("UPDATE genres SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(&fields.name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_genre))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
