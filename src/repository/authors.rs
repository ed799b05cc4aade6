//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::{AuthorFilter, Collection, Sort};
use crate::{
    error::AppResult,
    models::author::{Author, AuthorFields},
};

const COLUMNS: &str = "id, first_name, family_name, date_of_birth, date_of_death";

fn row_to_author(row: &PgRow) -> Author {
    Author {
        id: row.get("id"),
        first_name: row.get("first_name"),
        family_name: row.get("family_name"),
        date_of_birth: row.get("date_of_birth"),
        date_of_death: row.get("date_of_death"),
    }
}

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Collection<Author> for AuthorsRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let row = sqlx::query(&format!("SELECT {} FROM authors WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn find_one(&self, filter: &AuthorFilter) -> AppResult<Option<Author>> {
        match filter {
            AuthorFilter::All => {
                let row = sqlx::query(&format!("SELECT {} FROM authors LIMIT 1", COLUMNS))
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(row.as_ref().map(row_to_author))
            }
        }
    }

    async fn find_many(&self, filter: &AuthorFilter, sort: Sort) -> AppResult<Vec<Author>> {
        let order = match sort {
            Sort::Natural => " ORDER BY family_name ASC",
            Sort::Unsorted => "",
        };
        let rows = match filter {
            AuthorFilter::All => {
                sqlx::query(&format!("SELECT {} FROM authors{}", COLUMNS, order))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.iter().map(row_to_author).collect())
    }

    async fn count(&self, filter: &AuthorFilter) -> AppResult<i64> {
        let count = match filter {
            AuthorFilter::All => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    async fn insert(&self, fields: AuthorFields) -> AppResult<Author> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO authors (id, first_name, family_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.first_name)
        .bind(&fields.family_name)
        .bind(fields.date_of_birth)
        .bind(fields.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_author(&row))
    }

    async fn update_by_id(&self, id: Uuid, fields: AuthorFields) -> AppResult<Option<Author>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE authors
            SET first_name = $2, family_name = $3, date_of_birth = $4, date_of_death = $5
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(id)
        .bind(&fields.first_name)
        .bind(&fields.family_name)
        .bind(fields.date_of_birth)
        .bind(fields.date_of_death)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
