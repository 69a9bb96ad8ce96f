//! Carts and rents repository, and the Postgres unit of work for rentals

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        rental::day_window, BookCount, Cart, CartStatus, InventoryDeltas, PageParams, Rent,
        RentFilter, RentSummary,
    },
};

use super::{like_pattern, RentalStore, RentalTransaction};

const SUMMARY_SELECT: &str = r#"
    SELECT r.id AS rent_id, c.id AS cart_id, b.title AS book_title,
           s.first_name || ' ' || s.last_name AS student_name,
           c.created_at AS rented_date
    FROM rents r
    JOIN carts c ON c.id = r.cart_id
    JOIN books b ON b.id = r.book_id
    JOIN students s ON s.id = c.student_id
"#;

#[derive(Clone)]
pub struct CartsRepository {
    pool: Pool<Postgres>,
}

impl CartsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalStore for CartsRepository {
    async fn begin(&self) -> AppResult<Box<dyn RentalTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRentalTransaction { tx }))
    }

    async fn find_open_rents(
        &self,
        filter: &RentFilter,
        page: PageParams,
    ) -> AppResult<(Vec<RentSummary>, i64)> {
        let mut conditions = vec!["c.status = 'RENTED'".to_string()];
        let mut idx = 1;

        let title_pattern = filter.book_title.as_deref().map(like_pattern);
        if title_pattern.is_some() {
            conditions.push(format!("LOWER(b.title) LIKE ${}", idx));
            idx += 1;
        }

        let name_patterns = filter.student_name.as_ref().map(|name| {
            (
                like_pattern(&name.first_name),
                like_pattern(&name.last_name),
                like_pattern(&name.full_name),
            )
        });
        if name_patterns.is_some() {
            conditions.push(format!(
                "(LOWER(s.first_name) LIKE ${} OR LOWER(s.last_name) LIKE ${} \
                 OR LOWER(s.first_name || ' ' || s.last_name) LIKE ${})",
                idx,
                idx + 1,
                idx + 2
            ));
            idx += 3;
        }

        let window = filter.date.map(day_window);
        if window.is_some() {
            conditions.push(format!(
                "c.created_at >= ${} AND c.created_at < ${}",
                idx,
                idx + 1
            ));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        // Count total
        let count_q = format!(
            r#"
            SELECT COUNT(*)
            FROM rents r
            JOIN carts c ON c.id = r.cart_id
            JOIN books b ON b.id = r.book_id
            JOIN students s ON s.id = c.student_id
            {}
            "#,
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref p) = title_pattern {
            count_builder = count_builder.bind(p);
        }
        if let Some((ref first, ref last, ref full)) = name_patterns {
            count_builder = count_builder.bind(first).bind(last).bind(full);
        }
        if let Some((start, end)) = window {
            count_builder = count_builder.bind(start).bind(end);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        // Fetch rows
        let select_q = format!(
            "{} {} ORDER BY c.created_at DESC, r.id LIMIT {} OFFSET {}",
            SUMMARY_SELECT, where_clause, page.limit, page.offset
        );
        let mut builder = sqlx::query_as::<_, RentSummary>(&select_q);
        if let Some(ref p) = title_pattern {
            builder = builder.bind(p);
        }
        if let Some((ref first, ref last, ref full)) = name_patterns {
            builder = builder.bind(first).bind(last).bind(full);
        }
        if let Some((start, end)) = window {
            builder = builder.bind(start).bind(end);
        }
        let rows = builder.fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    async fn rented_books_by_card(&self, card_id: Option<&str>) -> AppResult<Vec<RentSummary>> {
        let query = format!(
            "{} WHERE c.status = 'RENTED' AND ($1::text IS NULL OR s.card_id = $1) \
             ORDER BY c.created_at DESC, r.id",
            SUMMARY_SELECT
        );
        let rows = sqlx::query_as::<_, RentSummary>(&query)
            .bind(card_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Unit of work backed by a Postgres transaction; rolled back on drop
pub struct PgRentalTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RentalTransaction for PgRentalTransaction {
    async fn adjust_counts(&mut self, deltas: &InventoryDeltas) -> AppResult<()> {
        if deltas.is_empty() {
            return Ok(());
        }

        // Ascending id order. NO KEY UPDATE still admits the KEY SHARE locks
        // taken by foreign keys on rents.book_id.
        let locked = sqlx::query_as::<_, BookCount>(
            "SELECT id, title, count FROM books WHERE id = ANY($1) ORDER BY id FOR NO KEY UPDATE",
        )
        .bind(deltas.book_ids())
        .fetch_all(&mut *self.tx)
        .await?;

        let current: HashMap<Uuid, BookCount> =
            locked.into_iter().map(|book| (book.id, book)).collect();
        let (ids, counts): (Vec<Uuid>, Vec<i32>) = deltas.apply(&current)?.into_iter().unzip();

        sqlx::query(
            r#"
            UPDATE books AS b
            SET count = d.count, updated_at = NOW()
            FROM UNNEST($1::uuid[], $2::int4[]) AS d(id, count)
            WHERE b.id = d.id
            "#,
        )
        .bind(&ids)
        .bind(&counts)
        .execute(&mut *self.tx)
        .await?;

        tracing::debug!("Adjusted counts of {} books", ids.len());
        Ok(())
    }

    async fn open_cart(&mut self, student_id: Uuid) -> AppResult<Cart> {
        let cart = Cart::open(student_id, Utc::now());

        sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (id, student_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(cart.id)
        .bind(cart.student_id)
        .bind(cart.status)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_constraint(e, format!("Student {} does not exist", student_id)))
    }

    async fn add_line_items(&mut self, cart_id: Uuid, book_ids: &[Uuid]) -> AppResult<Vec<Rent>> {
        let rents = Rent::for_books(cart_id, book_ids, Utc::now());
        let Some(created_at) = rents.first().map(|r| r.created_at) else {
            return Ok(rents);
        };
        let ids: Vec<Uuid> = rents.iter().map(|r| r.id).collect();

        sqlx::query(
            r#"
            INSERT INTO rents (id, cart_id, book_id, created_at)
            SELECT r.id, $2, r.book_id, $4
            FROM UNNEST($1::uuid[], $3::uuid[]) AS r(id, book_id)
            "#,
        )
        .bind(&ids)
        .bind(cart_id)
        .bind(book_ids)
        .bind(created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::from_constraint(e, "Rented book no longer exists"))?;

        Ok(rents)
    }

    async fn lock_cart(&mut self, cart_id: Uuid) -> AppResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1 FOR UPDATE")
            .bind(cart_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(cart)
    }

    async fn line_items_for_cart(&mut self, cart_id: Uuid) -> AppResult<Vec<Rent>> {
        let rents = sqlx::query_as::<_, Rent>(
            "SELECT * FROM rents WHERE cart_id = $1 ORDER BY created_at, id",
        )
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rents)
    }

    async fn close_cart(&mut self, cart_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE carts
            SET status = $2, returned_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(cart_id)
        .bind(CartStatus::Returned)
        .bind(CartStatus::Rented)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let status = sqlx::query_scalar::<_, CartStatus>("SELECT status FROM carts WHERE id = $1")
            .bind(cart_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        match status {
            None => Err(AppError::NotFound(format!("Cart {} not found", cart_id))),
            Some(status) => Err(AppError::AlreadyClosed(format!(
                "cart {} is not currently rented (status: {})",
                cart_id, status
            ))),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
