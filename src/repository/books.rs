//! Books repository for database operations.
//!
//! Genre references live in a `uuid[]` column; "books of genre X" is an
//! `= ANY(genre)` match.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::{BookFilter, Collection, Sort};
use crate::{
    error::AppResult,
    models::book::{Book, BookFields},
};

const COLUMNS: &str = "id, title, author, summary, isbn, genre";

fn row_to_book(row: &PgRow) -> Book {
    Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        summary: row.get("summary"),
        isbn: row.get("isbn"),
        genre: row.get("genre"),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// WHERE clause and its single optional bind for a filter
    fn condition(filter: &BookFilter) -> (&'static str, Option<Uuid>) {
        match filter {
            BookFilter::All => ("", None),
            BookFilter::Author(id) => (" WHERE author = $1", Some(*id)),
            BookFilter::Genre(id) => (" WHERE $1 = ANY(genre)", Some(*id)),
        }
    }

    async fn select(&self, filter: &BookFilter, tail: &str) -> AppResult<Vec<PgRow>> {
        let (condition, param) = Self::condition(filter);
        let sql = format!("SELECT {} FROM books{}{}", COLUMNS, condition, tail);
        let mut query = sqlx::query(&sql);
        if let Some(id) = param {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl Collection<Book> for BooksRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_book))
    }

    async fn find_one(&self, filter: &BookFilter) -> AppResult<Option<Book>> {
        let rows = self.select(filter, " LIMIT 1").await?;
        Ok(rows.first().map(row_to_book))
    }

    async fn find_many(&self, filter: &BookFilter, _sort: Sort) -> AppResult<Vec<Book>> {
        // Books have no natural key; both orders are store order.
        let rows = self.select(filter, "").await?;
        Ok(rows.iter().map(row_to_book).collect())
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let (condition, param) = Self::condition(filter);
        let sql = format!("SELECT COUNT(*) FROM books{}", condition);
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(id) = param {
            query = query.bind(id);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn insert(&self, fields: BookFields) -> AppResult<Book> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO books (id, title, author, summary, isbn, genre)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.title)
        .bind(fields.author)
        .bind(&fields.summary)
        .bind(&fields.isbn)
        .bind(&fields.genre)
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_book(&row))
    }

    async fn update_by_id(&self, id: Uuid, fields: BookFields) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, summary = $4, isbn = $5, genre = $6
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(fields.author)
        .bind(&fields.summary)
        .bind(&fields.isbn)
        .bind(&fields.genre)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_book))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
