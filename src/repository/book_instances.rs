//! Book instances repository for database operations

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::{BookInstanceFilter, Collection, Sort};
use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceFields, BookStatus},
};

const COLUMNS: &str = "id, book, imprint, status, due_back";

fn row_to_instance(row: &PgRow) -> AppResult<BookInstance> {
    let status: String = row.get("status");
    let status = status
        .parse::<BookStatus>()
        .map_err(|_| AppError::Storage(format!("unknown book status '{}'", status)))?;
    Ok(BookInstance {
        id: row.get("id"),
        book: row.get("book"),
        imprint: row.get("imprint"),
        status,
        due_back: row.get("due_back"),
    })
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn select(&self, filter: &BookInstanceFilter, tail: &str) -> AppResult<Vec<PgRow>> {
        let rows = match filter {
            BookInstanceFilter::All => {
                sqlx::query(&format!("SELECT {} FROM book_instances{}", COLUMNS, tail))
                    .fetch_all(&self.pool)
                    .await?
            }
            BookInstanceFilter::Book(book) => {
                sqlx::query(&format!(
                    "SELECT {} FROM book_instances WHERE book = $1{}",
                    COLUMNS, tail
                ))
                .bind(book)
                .fetch_all(&self.pool)
                .await?
            }
            BookInstanceFilter::Status(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM book_instances WHERE status = $1{}",
                    COLUMNS, tail
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl Collection<BookInstance> for BookInstancesRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query(&format!("SELECT {} FROM book_instances WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_instance).transpose()
    }

    async fn find_one(&self, filter: &BookInstanceFilter) -> AppResult<Option<BookInstance>> {
        let rows = self.select(filter, " LIMIT 1").await?;
        rows.first().map(row_to_instance).transpose()
    }

    async fn find_many(
        &self,
        filter: &BookInstanceFilter,
        _sort: Sort,
    ) -> AppResult<Vec<BookInstance>> {
        let rows = self.select(filter, "").await?;
        rows.iter().map(row_to_instance).collect()
    }

    async fn count(&self, filter: &BookInstanceFilter) -> AppResult<i64> {
        let count = match filter {
            BookInstanceFilter::All => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM book_instances")
                    .fetch_one(&self.pool)
                    .await?
            }
            BookInstanceFilter::Book(book) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM book_instances WHERE book = $1")
                    .bind(book)
                    .fetch_one(&self.pool)
                    .await?
            }
            BookInstanceFilter::Status(status) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM book_instances WHERE status = $1",
                )
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(count)
    }

    async fn insert(&self, fields: BookInstanceFields) -> AppResult<BookInstance> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO book_instances (id, book, imprint, status, due_back)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(fields.book)
        .bind(&fields.imprint)
        .bind(fields.status.as_str())
        .bind(fields.due_back)
        .fetch_one(&self.pool)
        .await?;
        row_to_instance(&row)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        fields: BookInstanceFields,
    ) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE book_instances
            SET book = $2, imprint = $3, status = $4, due_back = $5
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(fields.book)
        .bind(&fields.imprint)
        .bind(fields.status.as_str())
        .bind(fields.due_back)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_instance).transpose()
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
