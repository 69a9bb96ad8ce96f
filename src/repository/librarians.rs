//! Librarian accounts repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Librarian,
};

#[derive(Clone)]
pub struct LibrariansRepository {
    pool: Pool<Postgres>,
}

impl LibrariansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Librarian> {
        sqlx::query_as::<_, Librarian>("SELECT * FROM librarians WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Librarian with id {} not found", id)))
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<Librarian>> {
        let librarian =
            sqlx::query_as::<_, Librarian>("SELECT * FROM librarians WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(librarian)
    }

    /// Insert a librarian. Fails with `Conflict` when the username is taken.
    pub async fn create(&self, librarian: &Librarian) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO librarians (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(librarian.id)
        .bind(&librarian.username)
        .bind(&librarian.password_hash)
        .bind(librarian.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_constraint(e, format!("Librarian {} already exists", librarian.username))
        })?;
        Ok(())
    }
}
