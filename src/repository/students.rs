//! Students repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{PageParams, Student},
};

use super::StudentLookup;

#[derive(Clone)]
pub struct StudentsRepository {
    pool: Pool<Postgres>,
}

impl StudentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List students, newest first
    pub async fn list(&self, page: PageParams) -> AppResult<(Vec<Student>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;

        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((students, total))
    }

    /// Get student by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    /// Get student by library card number
    pub async fn get_by_card_id(&self, card_id: &str) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE card_id = $1")
            .bind(card_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with card {} not found", card_id)))
    }

    /// Insert a new student. Fails with `Conflict` on a duplicate card number.
    pub async fn create(&self, student: &Student) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, card_id, first_name, last_name, major, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(student.id)
        .bind(&student.card_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.major)
        .bind(&student.phone)
        .bind(student.created_at)
        .bind(student.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_constraint(e, format!("Student card {} already exists", student.card_id))
        })
    }

    /// Delete a student. Fails with `Conflict` while carts reference it.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, format!("Student {} has rental history", id)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Student with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl StudentLookup for StudentsRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Student> {
        StudentsRepository::get_by_id(self, id).await
    }
}
