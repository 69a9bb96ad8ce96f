//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, PageParams},
};

use super::{like_pattern, BookLookup};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books, newest first. `search` matches an id exactly or a
    /// case-insensitive title fragment.
    pub async fn list(&self, search: Option<&str>, page: PageParams) -> AppResult<(Vec<Book>, i64)> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let by_id = search.and_then(|s| Uuid::parse_str(s).ok());

        let where_clause = match (search, by_id) {
            (_, Some(_)) => "WHERE id = $1",
            (Some(_), None) => "WHERE LOWER(title) LIKE $1",
            (None, None) => "",
        };
        let title_pattern = search.map(|s| like_pattern(&s.to_lowercase()));

        let count_q = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(id) = by_id {
            count_builder = count_builder.bind(id);
        } else if let Some(ref pattern) = title_pattern {
            count_builder = count_builder.bind(pattern);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM books {} ORDER BY created_at DESC, id LIMIT {} OFFSET {}",
            where_clause, page.limit, page.offset
        );
        let mut builder = sqlx::query_as::<_, Book>(&select_q);
        if let Some(id) = by_id {
            builder = builder.bind(id);
        } else if let Some(ref pattern) = title_pattern {
            builder = builder.bind(pattern);
        }
        let books = builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn get_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Insert a new book
    pub async fn create(&self, book: &Book) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, description, count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.count)
        .bind(book.created_at)
        .bind(book.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a book. Fails with `Conflict` while rent rows reference it.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, format!("Book {} has rental history", id)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BookLookup for BooksRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        BooksRepository::get_by_id(self, id).await
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Book>> {
        BooksRepository::get_by_ids(self, ids).await
    }
}
