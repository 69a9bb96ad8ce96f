//! Aggregate queries behind the overdue and rental reports

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{BookRentStats, OverdueCriteria, OverdueRow, PageParams, RentTotals},
};

use super::ReportStore;

/// Per-student aggregate over open carts with whole days elapsed since the
/// earliest one. `$1` is the reference instant, `$2` an optional card filter.
const OPEN_CARTS_BY_STUDENT: &str = r#"
    WITH open_rents AS (
        SELECT s.id AS student_id, s.first_name, s.last_name, s.card_id, s.phone,
               COUNT(r.id) AS total_books,
               MIN(c.created_at) AS date_rented
        FROM students s
        JOIN carts c ON c.student_id = s.id AND c.status = 'RENTED'
        JOIN rents r ON r.cart_id = c.id
        WHERE ($2::text IS NULL OR s.card_id = $2)
        GROUP BY s.id
    ),
    aged AS (
        SELECT o.*,
               FLOOR(EXTRACT(EPOCH FROM ($1::timestamptz - o.date_rented)) / 86400)::BIGINT AS elapsed_days
        FROM open_rents o
    )
"#;

#[derive(Clone)]
pub struct ReportsRepository {
    pool: Pool<Postgres>,
}

impl ReportsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for ReportsRepository {
    async fn overdue_students(
        &self,
        criteria: &OverdueCriteria,
    ) -> AppResult<(Vec<OverdueRow>, i64)> {
        let count_q = format!(
            "{} SELECT COUNT(*) FROM aged WHERE elapsed_days > $3",
            OPEN_CARTS_BY_STUDENT
        );
        let total = sqlx::query_scalar::<_, i64>(&count_q)
            .bind(criteria.now)
            .bind(criteria.card_id.as_deref())
            .bind(criteria.period_days)
            .fetch_one(&self.pool)
            .await?;

        let select_q = format!(
            r#"
            {}
            SELECT (
                       SELECT c.id FROM carts c
                       WHERE c.student_id = a.student_id AND c.status = 'RENTED'
                       ORDER BY c.created_at, c.id
                       LIMIT 1
                   ) AS cart_id,
                   a.first_name, a.last_name, a.card_id, a.phone,
                   a.total_books, a.date_rented, a.elapsed_days
            FROM aged a
            WHERE a.elapsed_days > $3
            ORDER BY a.elapsed_days DESC, a.date_rented, a.card_id
            LIMIT $4 OFFSET $5
            "#,
            OPEN_CARTS_BY_STUDENT
        );
        let rows = sqlx::query_as::<_, OverdueRow>(&select_q)
            .bind(criteria.now)
            .bind(criteria.card_id.as_deref())
            .bind(criteria.period_days)
            .bind(criteria.page.limit)
            .bind(criteria.page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn rent_totals(&self) -> AppResult<RentTotals> {
        let totals = sqlx::query_as::<_, RentTotals>(
            r#"
            SELECT (SELECT COUNT(*) FROM rents) AS total_rents,
                   (SELECT COUNT(DISTINCT student_id) FROM carts) AS total_students
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn top_books(&self, page: PageParams) -> AppResult<Vec<BookRentStats>> {
        let rows = sqlx::query_as::<_, BookRentStats>(
            r#"
            SELECT b.title AS book_title, COUNT(r.id) AS rented_count
            FROM rents r
            JOIN books b ON b.id = r.book_id
            GROUP BY b.id, b.title
            ORDER BY rented_count DESC, b.title, b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
